//! Application-scoped access to a shared `Processor`.
//!
//! The registry is an ordinary value owned by the application; whoever needs
//! the Knowledge Base client receives the registry (or the `Arc` it hands
//! out). The processor is built on first request and shared afterwards.

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::client::KnowledgeBaseClient;
use crate::config::KnowledgeBaseConfig;
use crate::error::Result;
use crate::processor::Processor;
use crate::transport::UreqTransport;

#[derive(Debug)]
pub struct ServiceRegistry {
    config: KnowledgeBaseConfig,
    processor: OnceLock<Arc<Processor>>,
}

impl ServiceRegistry {
    pub fn new(config: KnowledgeBaseConfig) -> Self {
        Self {
            config,
            processor: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &KnowledgeBaseConfig {
        &self.config
    }

    /// The shared processor, constructed on first call.
    ///
    /// A construction failure is returned and not remembered; the next call
    /// tries again.
    pub fn processor(&self) -> Result<Arc<Processor>> {
        if let Some(processor) = self.processor.get() {
            return Ok(Arc::clone(processor));
        }
        let client = KnowledgeBaseClient::new(self.config.endpoint()?)?;
        info!(endpoint = client.endpoint(), "knowledge base processor registered");
        let built = Arc::new(Processor::with_transport(
            client,
            UreqTransport::new(self.config.timeout()),
        ));
        // Another thread may have won the race; hand out whichever was stored.
        Ok(Arc::clone(self.processor.get_or_init(|| built)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn processor_is_shared() {
        let registry = ServiceRegistry::new(KnowledgeBaseConfig::with_endpoint("http://kb.local/"));
        let first = registry.processor().unwrap();
        let second = registry.processor().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.client().endpoint(), "http://kb.local");
    }

    #[test]
    fn missing_endpoint_fails_every_time() {
        let registry = ServiceRegistry::new(KnowledgeBaseConfig::default());
        assert!(matches!(registry.processor(), Err(ApiError::MissingEndpoint)));
        assert!(matches!(registry.processor(), Err(ApiError::MissingEndpoint)));
    }

    #[test]
    fn separate_registries_do_not_share() {
        let config = KnowledgeBaseConfig::with_endpoint("http://kb.local");
        let a = ServiceRegistry::new(config.clone()).processor().unwrap();
        let b = ServiceRegistry::new(config).processor().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
