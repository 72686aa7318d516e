//! Synchronous client for the Knowledge Base service (articles and tags).
//!
//! # Overview
//! `KnowledgeBaseClient` builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network. `Processor` runs each
//! operation as one blocking round-trip through a `Transport`, and
//! `ServiceRegistry` hands out a single shared `Processor` per application.
//!
//! # Design
//! - Article documents are untyped `serde_json::Value`s, passed through
//!   verbatim.
//! - Every request carries `x-location-group`; every success is a
//!   `ResponseEnvelope` (body, allow-listed headers, status).
//! - 4xx responses become `ApiError::Upstream` with a serialized
//!   `ErrorPayload` message; 5xx and network errors pass through.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod processor;
pub mod registry;
pub mod transport;
pub mod types;

pub use client::{KnowledgeBaseClient, LOCATION_GROUP_HEADER};
pub use crate::config::KnowledgeBaseConfig;
pub use error::{ApiError, ClientStatusError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use processor::Processor;
pub use registry::ServiceRegistry;
pub use transport::{Transport, UreqTransport};
pub use types::{ErrorPayload, Filter, ResponseEnvelope};
