//! Blocking Knowledge Base operations.
//!
//! `Processor` pairs a `KnowledgeBaseClient` with a `Transport`: each method
//! builds one request, performs exactly one round-trip and parses the result.
//! Nothing is retried or cached.

use serde::Serialize;
use tracing::{debug, warn};

use crate::client::KnowledgeBaseClient;
use crate::error::{ApiError, Result};
use crate::http::HttpRequest;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Filter, ResponseEnvelope};

#[derive(Debug, Clone)]
pub struct Processor<T = UreqTransport> {
    client: KnowledgeBaseClient,
    transport: T,
}

impl Processor<UreqTransport> {
    /// Processor for `endpoint` using the default blocking transport.
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self::with_transport(
            KnowledgeBaseClient::new(endpoint)?,
            UreqTransport::default(),
        ))
    }
}

impl<T: Transport> Processor<T> {
    pub fn with_transport(client: KnowledgeBaseClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &KnowledgeBaseClient {
        &self.client
    }

    /// List articles, optionally narrowed by `filter`.
    pub fn list(&self, filter: Option<&Filter>, location_group: &str) -> Result<ResponseEnvelope> {
        let request = self.client.build_list_articles(filter, location_group)?;
        self.send(request)
    }

    pub fn get(&self, article_id: &str, location_group: &str) -> Result<ResponseEnvelope> {
        let request = self.client.build_get_article(article_id, location_group);
        self.send(request)
    }

    pub fn create<D: Serialize + ?Sized>(
        &self,
        data: &D,
        location_group: &str,
    ) -> Result<ResponseEnvelope> {
        let request = self.client.build_create_article(data, location_group)?;
        self.send(request)
    }

    pub fn update<D: Serialize + ?Sized>(
        &self,
        article_id: &str,
        data: &D,
        location_group: &str,
    ) -> Result<ResponseEnvelope> {
        let request = self
            .client
            .build_update_article(article_id, data, location_group)?;
        self.send(request)
    }

    pub fn delete(&self, article_id: &str, location_group: &str) -> Result<ResponseEnvelope> {
        let request = self.client.build_delete_article(article_id, location_group);
        self.send(request)
    }

    pub fn list_tags(&self, location_group: &str) -> Result<ResponseEnvelope> {
        let request = self.client.build_list_tags(location_group);
        self.send(request)
    }

    fn send(&self, request: HttpRequest) -> Result<ResponseEnvelope> {
        debug!(method = %request.method, path = %request.path, "sending knowledge base request");
        let response = self.transport.execute(&request)?;
        let status = response.status;
        let result = self.client.parse_response(&request, response);
        match &result {
            Ok(_) => debug!(status, "knowledge base request succeeded"),
            Err(ApiError::Upstream { .. }) => {
                warn!(method = %request.method, path = %request.path, status, "knowledge base rejected request")
            }
            Err(err) => debug!(error = %err, "knowledge base request failed"),
        }
        result
    }
}
