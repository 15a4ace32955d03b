//! Time limiter: one deadline over the whole composed call
//!
//! Expiry cancels the in-flight future cooperatively; any pending retry
//! wait or adapter I/O is dropped with it.

use gateway_core::error::{GatewayError, Result};
use std::future::Future;
use std::time::Duration;

/// Bound `fut` by `deadline`, classifying expiry as a gateway timeout
pub async fn with_deadline<T, F>(service_name: &str, deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout {
            service: service_name.to_string(),
            seconds: deadline.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_timeout() {
        let result: Result<()> = with_deadline("samos-adapter", Duration::from_secs(30), async {
            tokio::time::sleep(Duration::from_secs(45)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "Timeout");
        assert_eq!(err.http_status(), 504);
    }

    #[tokio::test]
    async fn test_completion_within_deadline() {
        let result = with_deadline("svc", Duration::from_secs(5), async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
