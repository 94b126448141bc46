//! Runtime helpers used by the list retry policy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Async clock-independent sleeping abstraction for retry backoff.
#[async_trait]
pub trait RefetchSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Runtime helpers injected into the record cache.
pub struct RecordCacheRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn RefetchSleeper>,
}

impl Default for RecordCacheRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RefetchSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
