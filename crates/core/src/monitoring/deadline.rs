//! Caller-supplied deadlines.

use std::future::Future;
use std::time::Duration;

use ledgerwatch_shared::error::AppError;
use thiserror::Error;

/// An operation ran past its deadline and was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} timed out after {after:?}")]
pub struct DeadlineExceeded {
    /// Name of the abandoned operation.
    pub operation: &'static str,
    /// The deadline that elapsed.
    pub after: Duration,
}

impl From<DeadlineExceeded> for AppError {
    fn from(err: DeadlineExceeded) -> Self {
        Self::Timeout(err.to_string())
    }
}

/// Runs `fut` to completion, or fails with [`DeadlineExceeded`] after `deadline`.
///
/// `None` means no deadline. Dropping the future on timeout rolls back any
/// database transaction it held open.
pub async fn with_deadline<T, E, F>(
    deadline: Option<Duration>,
    operation: &'static str,
    fut: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    match deadline {
        None => fut.await,
        Some(after) => match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => Err(DeadlineExceeded { operation, after }.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Timeout(&'static str),
    }

    impl From<DeadlineExceeded> for TestError {
        fn from(err: DeadlineExceeded) -> Self {
            Self::Timeout(err.operation)
        }
    }

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result: Result<u32, TestError> =
            with_deadline(Some(Duration::from_secs(5)), "quick", async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let result: Result<u32, TestError> =
            with_deadline(Some(Duration::from_millis(50)), "slow", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(1)
            })
            .await;
        assert_eq!(result, Err(TestError::Timeout("slow")));
    }

    #[test]
    fn test_maps_to_app_timeout() {
        let err = AppError::from(DeadlineExceeded {
            operation: "validate_all_balances",
            after: Duration::from_secs(120),
        });
        assert_eq!(err.error_code(), "TIMEOUT");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_no_deadline() {
        let result: Result<u32, TestError> = with_deadline(None, "open", async { Ok(3) }).await;
        assert_eq!(result, Ok(3));
    }
}
