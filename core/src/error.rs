//! Error types for the Knowledge Base client.
//!
//! # Design
//! A 4xx response is the only failure this crate reformats: it becomes
//! `ApiError::Upstream`, whose message is the JSON-serialized `ErrorPayload`
//! and whose source is the `ClientStatusError` describing the rejected call.
//! Server errors and network failures are passed through as `HttpStatus` and
//! `Transport` without any diagnostic payload.

use thiserror::Error;

use crate::http::HttpMethod;
use crate::types::ErrorPayload;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Errors returned by client construction, configuration and operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No endpoint was configured, or it was blank.
    #[error("Knowledge Base service: endpoint is not configured")]
    MissingEndpoint,

    /// Configuration sources could not be read or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The service rejected the request with a 4xx status.
    #[error("{}", .payload.to_json())]
    Upstream {
        payload: Box<ErrorPayload>,
        #[source]
        source: ClientStatusError,
    },

    /// A non-success status outside the 4xx class, passed through as-is.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl ApiError {
    /// Diagnostic payload of an upstream 4xx rejection.
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            ApiError::Upstream { payload, .. } => Some(&**payload),
            _ => None,
        }
    }

    /// HTTP status of the failed exchange, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Upstream { source, .. } => Some(source.status),
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The underlying 4xx rejection wrapped by `ApiError::Upstream`.
#[derive(Debug, Error)]
#[error("{method} {path} returned client error status {status}")]
pub struct ClientStatusError {
    pub method: HttpMethod,
    pub path: String,
    pub status: u16,
}

/// A transport-level failure (DNS, connect, TLS, timeout, broken body).
#[derive(Debug, Error)]
#[error("{method} {path} failed: {source}")]
pub struct TransportError {
    pub method: HttpMethod,
    pub path: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse};

    fn upstream() -> ApiError {
        let request = HttpRequest {
            method: HttpMethod::Get,
            path: "http://kb/knowledge/articles/missing".to_string(),
            headers: vec![("x-location-group".to_string(), "lg".to_string())],
            body: None,
        };
        let response = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: r#"{"error":"not found"}"#.to_string(),
        };
        ApiError::Upstream {
            payload: Box::new(ErrorPayload::from_exchange(&request, &response)),
            source: ClientStatusError {
                method: request.method,
                path: request.path.clone(),
                status: response.status,
            },
        }
    }

    #[test]
    fn upstream_message_is_serialized_payload() {
        let err = upstream();
        let message: serde_json::Value = serde_json::from_str(&err.to_string()).unwrap();
        assert_eq!(message["request"]["headers"]["x-location-group"][0], "lg");
        assert_eq!(message["response"]["status"], 404);
        assert_eq!(message["response"]["body"], r#"{"error":"not found"}"#);
    }

    #[test]
    fn upstream_wraps_client_status_as_source() {
        let err = upstream();
        let source = err.source().unwrap();
        assert!(source.to_string().contains("404"));
        assert_eq!(err.status(), Some(404));
        assert!(err.payload().is_some());
    }

    #[test]
    fn pass_through_status_has_no_payload() {
        let err = ApiError::HttpStatus {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
        assert!(err.payload().is_none());
        assert_eq!(err.status(), Some(503));
    }
}
