//! Stateless HTTP request builder and response parser for the Knowledge Base
//! service.
//!
//! # Design
//! `KnowledgeBaseClient` holds only the endpoint and carries no mutable state
//! between calls. Each operation has a `build_*` method producing an
//! `HttpRequest`; every response goes through `parse_response`, which needs
//! the originating request so a 4xx rejection can report both sides of the
//! exchange. `Processor` glues the two halves to a `Transport`.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ClientStatusError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{ErrorPayload, Filter, ResponseEnvelope};

/// Header carrying the tenant scope of every request.
pub const LOCATION_GROUP_HEADER: &str = "x-location-group";

const ARTICLES_PATH: &str = "/knowledge/articles";
const TAGS_PATH: &str = "/knowledge/tags";

/// Synchronous, stateless request builder for the Knowledge Base API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBaseClient {
    endpoint: String,
}

impl KnowledgeBaseClient {
    /// Bind the client to `endpoint`. Fails with `MissingEndpoint` when it is
    /// blank; a trailing slash is dropped.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(ApiError::MissingEndpoint);
        }
        Ok(Self {
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_list_articles(
        &self,
        filter: Option<&Filter>,
        location_group: &str,
    ) -> Result<HttpRequest> {
        let path = match filter.filter(|f| !f.is_empty()) {
            Some(filter) => {
                let json = serde_json::to_string(filter).map_err(ApiError::Serialization)?;
                format!("{ARTICLES_PATH}?filter={}", urlencoding::encode(&json))
            }
            None => ARTICLES_PATH.to_string(),
        };
        Ok(self.request(HttpMethod::Get, &path, location_group, None))
    }

    pub fn build_get_article(&self, article_id: &str, location_group: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &article_path(article_id), location_group, None)
    }

    pub fn build_create_article<T: Serialize + ?Sized>(
        &self,
        data: &T,
        location_group: &str,
    ) -> Result<HttpRequest> {
        let body = serde_json::to_string(data).map_err(ApiError::Serialization)?;
        Ok(self.request(HttpMethod::Post, ARTICLES_PATH, location_group, Some(body)))
    }

    pub fn build_update_article<T: Serialize + ?Sized>(
        &self,
        article_id: &str,
        data: &T,
        location_group: &str,
    ) -> Result<HttpRequest> {
        let body = serde_json::to_string(data).map_err(ApiError::Serialization)?;
        Ok(self.request(
            HttpMethod::Put,
            &article_path(article_id),
            location_group,
            Some(body),
        ))
    }

    pub fn build_delete_article(&self, article_id: &str, location_group: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &article_path(article_id), location_group, None)
    }

    pub fn build_list_tags(&self, location_group: &str) -> HttpRequest {
        self.request(HttpMethod::Get, TAGS_PATH, location_group, None)
    }

    /// Turn the response to `request` into an envelope or an error.
    ///
    /// 4xx becomes `Upstream`, any other status from 500 up becomes
    /// `HttpStatus`; everything else is decoded as JSON.
    pub fn parse_response(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<ResponseEnvelope> {
        match response.status {
            400..=499 => Err(ApiError::Upstream {
                payload: Box::new(ErrorPayload::from_exchange(request, &response)),
                source: ClientStatusError {
                    method: request.method,
                    path: request.path.clone(),
                    status: response.status,
                },
            }),
            status if status >= 500 => Err(ApiError::HttpStatus {
                status,
                body: response.body,
            }),
            _ => {
                let body = decode_body(&response.body)?;
                Ok(ResponseEnvelope::from_response(body, &response))
            }
        }
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        location_group: &str,
        body: Option<String>,
    ) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.endpoint),
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                (LOCATION_GROUP_HEADER.to_string(), location_group.to_string()),
            ],
            body,
        }
    }
}

fn article_path(article_id: &str) -> String {
    format!("{ARTICLES_PATH}/{}", urlencoding::encode(article_id))
}

/// An empty body decodes to `null`.
fn decode_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(ApiError::Deserialization)
}
