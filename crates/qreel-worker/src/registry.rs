//! Handler registry.
//!
//! Dispatch is an explicit map from the job type tag to a handler;
//! unknown tags are rejected deterministically by the executor.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WorkerResult;

/// A pipeline handler for one job type.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The `job_type` tag this handler serves.
    fn job_type(&self) -> &'static str;

    /// Run the pipeline for one claimed job payload.
    async fn handle(&self, payload: &serde_json::Value) -> WorkerResult<()>;
}

/// Map from job type tag to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own job type tag.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler.job_type(), handler);
    }

    /// Look up the handler for a tag.
    pub fn get(&self, job_type: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(job_type).cloned()
    }

    /// Registered tags, for logging at startup.
    pub fn job_types(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler;

    #[async_trait]
    impl JobHandler for NoopHandler {
        fn job_type(&self) -> &'static str {
            "noop"
        }

        async fn handle(&self, _payload: &serde_json::Value) -> WorkerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn registered_handlers_are_found_by_tag() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(NoopHandler));

        assert!(registry.get("noop").is_some());
        assert!(registry.get("unknown_type").is_none());
        assert_eq!(registry.job_types(), vec!["noop"]);
    }
}
