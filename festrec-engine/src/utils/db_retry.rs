//! Database Retry Logic
//!
//! Exponential backoff for transient SQLite lock errors. Bounded by
//! `store.max_lock_wait_ms`; any other error fails immediately.

use crate::error::{ReconcileError, ReconcileResult};
use std::time::{Duration, Instant};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

fn is_lock_error(err: &ReconcileError) -> bool {
    matches!(err, ReconcileError::Common(inner) if inner.is_lock_error())
}

/// Retry a store operation while it fails with "database is locked"
///
/// Backoff starts at 10ms and doubles up to 1000ms. Once `max_wait_ms` has
/// elapsed the last lock error is returned to the caller unchanged.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> ReconcileResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ReconcileResult<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Store operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !is_lock_error(&err) => return Err(err),
            Err(err) => {
                let elapsed = start_time.elapsed();
                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        max_wait_ms,
                        "Store operation failed: database still locked"
                    );
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    remaining_ms = max_duration.saturating_sub(elapsed).as_millis() as u64,
                    "Database locked, will retry after backoff"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn locked() -> ReconcileError {
        sqlx::Error::Protocol("database is locked".to_string()).into()
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = retry_on_lock("test_op", 5000, || async { Ok::<_, ReconcileError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_succeeds_after_lock_errors() {
        let attempts = AtomicU32::new(0);

        let result = retry_on_lock("test_op", 5000, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(locked())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let attempts = AtomicU32::new(0);

        let result = retry_on_lock("test_op", 30, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(locked()) }
        })
        .await;

        assert!(matches!(result, Err(ReconcileError::Common(ref e)) if e.is_lock_error()));
        assert!(attempts.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_non_lock_error_fails_immediately() {
        let attempts = AtomicU32::new(0);

        let result = retry_on_lock("test_op", 5000, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ReconcileError::CorruptRow("bad".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(ReconcileError::CorruptRow(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
