//! Bounded retry loop for serialization conflicts.
//!
//! Under serializable isolation PostgreSQL aborts one of two transactions
//! it cannot order (SQLSTATE 40001/40P01). That is an expected cost of
//! contention, not a caller-visible error, so the affected attempt is
//! re-run here with exponential backoff and jitter.
//!
//! Only failures classified as retryable conflicts are retried. Business
//! errors (insufficient funds, unknown user) and fatal storage errors
//! propagate on the first attempt; exhausting the retry budget surfaces
//! the last underlying storage error as-is.

use crate::{
    db::{self, ErrorClass},
    error::AppError,
};
use std::time::Duration;

/// Attempt ceiling, counting the first try.
const MAX_ATTEMPTS: u32 = 5;

/// Base backoff before the first retry; doubles each attempt.
const BASE_DELAY_MS: u64 = 50;

/// Invoke `operation` until it succeeds, fails non-retryably, or the
/// attempt ceiling is reached.
///
/// The loop carries an explicit attempt counter and never recurses. The
/// backoff sleep suspends only this task; concurrent requests proceed.
pub async fn with_retry<F, Fut, T>(mut operation: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(AppError::Database(ref err))
                if db::classify(err) == ErrorClass::RetryableConflict
                    && attempt < MAX_ATTEMPTS =>
            {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "serialization conflict, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Delay before retry number `attempt + 1`.
///
/// Base delay doubles each attempt; a uniform random jitter of up to half
/// the current base is added so competing retriers desynchronize instead
/// of colliding again in lockstep.
fn backoff_delay(attempt: u32) -> Duration {
    use rand::Rng;

    let base = BASE_DELAY_MS << (attempt - 1);
    let jitter = rand::rng().random_range(0..=base / 2);
    Duration::from_millis(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use std::cell::Cell;

    #[test]
    fn backoff_doubles_with_bounded_jitter() {
        for attempt in 1..MAX_ATTEMPTS {
            let base = BASE_DELAY_MS << (attempt - 1);
            for _ in 0..20 {
                let delay = backoff_delay(attempt).as_millis() as u64;
                assert!(delay >= base, "delay {delay} below base {base}");
                assert!(delay <= base + base / 2, "delay {delay} above jitter cap");
            }
        }
    }

    #[tokio::test]
    async fn success_returns_immediately() {
        let calls = Cell::new(0u32);
        let result = with_retry(|| async {
            calls.set(calls.get() + 1);
            Ok::<_, AppError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn retryable_conflict_is_retried_until_success() {
        let calls = Cell::new(0u32);
        let result = with_retry(|| async {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(AppError::Database(test_support::serialization_failure()))
            } else {
                Ok("committed")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "committed");
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_the_underlying_storage_error() {
        let calls = Cell::new(0u32);
        let result: Result<(), AppError> = with_retry(|| async {
            calls.set(calls.get() + 1);
            Err(AppError::Database(test_support::serialization_failure()))
        })
        .await;

        assert_eq!(calls.get(), MAX_ATTEMPTS);
        match result {
            Err(AppError::Database(ref err)) => {
                assert_eq!(db::classify(err), ErrorClass::RetryableConflict);
            }
            other => panic!("expected the storage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn business_errors_are_never_retried() {
        let calls = Cell::new(0u32);
        let result: Result<(), AppError> = with_retry(|| async {
            calls.set(calls.get() + 1);
            Err(AppError::InsufficientFunds)
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(AppError::InsufficientFunds)));
    }

    #[tokio::test]
    async fn fatal_storage_errors_are_never_retried() {
        let calls = Cell::new(0u32);
        let result: Result<(), AppError> = with_retry(|| async {
            calls.set(calls.get() + 1);
            Err(AppError::Database(test_support::db_error(
                "23503",
                None,
                "foreign key violation",
            )))
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
