//! Value types exchanged with the Knowledge Base service.
//!
//! # Design
//! Article documents stay untyped (`serde_json::Value`): the service owns
//! their shape and this crate passes them through verbatim. Only the pieces
//! the client itself interprets get concrete types: the list filter, the
//! success envelope and the diagnostic payload attached to 4xx failures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{group_headers, HttpRequest, HttpResponse};

/// Response header carrying the total number of matching articles.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Response header carrying the caller's remaining request quota.
pub const RATELIMIT_REMAINING_HEADER: &str = "X-Ratelimit-Remaining";

/// The only response headers copied into a `ResponseEnvelope`.
pub const ENVELOPE_HEADERS: [&str; 2] = [TOTAL_COUNT_HEADER, RATELIMIT_REMAINING_HEADER];

/// Fixed human-readable message of every `ErrorPayload`.
pub const ERROR_MESSAGE: &str = "Something bad happened with Knowledge Base service";

/// Field-to-value criteria narrowing a list query.
///
/// Sent as a single `filter` query parameter holding the JSON-encoded map.
/// An empty filter is equivalent to no filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the criterion for `field`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Successful result of any operation: decoded body, the allow-listed
/// response headers that were present, and the HTTP status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub body: Value,
    pub headers: BTreeMap<String, String>,
    pub status_code: u16,
}

impl ResponseEnvelope {
    /// Build an envelope from a decoded body and the raw response.
    ///
    /// Headers outside `ENVELOPE_HEADERS` are dropped. Allow-listed headers
    /// that are missing or empty are omitted rather than stored as `""`.
    pub fn from_response(body: Value, response: &HttpResponse) -> Self {
        let mut headers = BTreeMap::new();
        for name in ENVELOPE_HEADERS {
            let values: Vec<&str> = response
                .header_values(name)
                .filter(|v| !v.trim().is_empty())
                .collect();
            if !values.is_empty() {
                headers.insert(name.to_string(), values.join(", "));
            }
        }
        Self {
            body,
            headers,
            status_code: response.status,
        }
    }

    pub fn total_count(&self) -> Option<u64> {
        self.headers.get(TOTAL_COUNT_HEADER)?.trim().parse().ok()
    }

    pub fn ratelimit_remaining(&self) -> Option<u64> {
        self.headers.get(RATELIMIT_REMAINING_HEADER)?.trim().parse().ok()
    }

    /// Discard headers and status, keeping only the decoded body.
    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Outgoing request as captured in an `ErrorPayload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDetails {
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: Option<String>,
}

/// Failed response as captured in an `ErrorPayload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDetails {
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    pub status: u16,
}

/// Diagnostic snapshot of a request/response exchange rejected with a 4xx.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    pub request: RequestDetails,
    pub response: ResponseDetails,
}

impl ErrorPayload {
    pub fn from_exchange(request: &HttpRequest, response: &HttpResponse) -> Self {
        Self {
            message: ERROR_MESSAGE.to_string(),
            request: RequestDetails {
                headers: group_headers(&request.headers),
                body: request.body.clone(),
            },
            response: ResponseDetails {
                headers: group_headers(&response.headers),
                body: response.body.clone(),
                status: response.status,
            },
        }
    }

    /// Serialize for use as an error message.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}
