//! Bulkhead: bounded concurrent admission per service
//!
//! Backpressure surfaces here. A rejected admission never consumes a
//! retry attempt because the retry loop sits inside the bulkhead.

use crate::policy::BulkheadConfig;
use gateway_core::error::{GatewayError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admission bound for one service
pub struct Bulkhead {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    max_wait: Duration,
}

impl Bulkhead {
    pub fn new(config: &BulkheadConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_calls)),
            max_concurrent: config.max_concurrent_calls,
            max_wait: Duration::from_millis(config.max_wait_millis),
        }
    }

    /// Acquire an in-flight slot, queueing up to the configured wait.
    /// The permit releases the slot on drop.
    pub async fn acquire(&self, service_name: &str) -> Result<OwnedSemaphorePermit> {
        let acquire = self.semaphore.clone().acquire_owned();
        match tokio::time::timeout(self.max_wait, acquire).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) | Err(_) => Err(GatewayError::AdapterUnavailable {
                service: service_name.to_string(),
                reason: format!(
                    "bulkhead exhausted ({} concurrent calls)",
                    self.max_concurrent
                ),
            }),
        }
    }

    /// Free in-flight slots right now
    pub fn free_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Bulkhead {
        Bulkhead::new(&BulkheadConfig {
            max_concurrent_calls: 2,
            max_wait_millis: 10,
        })
    }

    #[tokio::test]
    async fn test_bound_is_enforced() {
        let bulkhead = tiny();
        let p1 = bulkhead.acquire("svc").await.unwrap();
        let _p2 = bulkhead.acquire("svc").await.unwrap();
        assert_eq!(bulkhead.free_slots(), 0);

        let err = bulkhead.acquire("svc").await.unwrap_err();
        assert_eq!(err.kind(), "AdapterUnavailable");

        drop(p1);
        assert!(bulkhead.acquire("svc").await.is_ok());
    }

    #[tokio::test]
    async fn test_permit_release_on_drop() {
        let bulkhead = tiny();
        {
            let _p = bulkhead.acquire("svc").await.unwrap();
            assert_eq!(bulkhead.free_slots(), 1);
        }
        assert_eq!(bulkhead.free_slots(), 2);
    }
}
