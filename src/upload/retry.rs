//! Bounded exponential-backoff retry for individual network operations.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{Error, Result};

/// Total number of attempts made before a failure is surfaced.
pub const MAX_ATTEMPTS: u32 = 5;

/// Backoff before the attempt following failed attempt `attempt`
/// (1-indexed): a geometric progression with random jitter under 100ms
/// to avoid retrying in bursts.
fn backoff(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..100);
    Duration::from_millis(2u64.pow(attempt) * 100 + jitter)
}

/// Runs `op` up to [`MAX_ATTEMPTS`] times with exponential backoff.
///
/// There is no delay before the first attempt. `on_fail` is invoked for
/// every failed attempt, whether or not a retry follows; the last
/// attempt's error is returned, not swallowed.
///
/// # Errors
///
/// Returns the final attempt's error once all attempts are exhausted.
pub async fn exponential_backoff_retry<T, F, Fut, C>(mut op: F, mut on_fail: C) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    C: FnMut(&Error),
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                on_fail(&e);
                if attempt == MAX_ATTEMPTS {
                    return Err(e);
                }
                tokio::time::sleep(backoff(attempt)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn succeeds_immediately_without_callback() {
        let failures = Cell::new(0);
        let result =
            exponential_backoff_retry(|| async { Ok(7) }, |_| failures.set(failures.get() + 1))
                .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(failures.get(), 0);
    }

    #[tokio::test]
    async fn always_failing_op_makes_exactly_five_attempts() {
        let attempts = Cell::new(0u32);
        let failures = Cell::new(0u32);
        let result: Result<()> = exponential_backoff_retry(
            || {
                attempts.set(attempts.get() + 1);
                let n = attempts.get();
                async move { Err(Error::TransientUpload { message: format!("attempt {n}") }) }
            },
            |_| failures.set(failures.get() + 1),
        )
        .await;

        assert_eq!(attempts.get(), MAX_ATTEMPTS);
        assert_eq!(failures.get(), MAX_ATTEMPTS);
        // The final attempt's error is the one propagated.
        match result.unwrap_err() {
            Error::TransientUpload { message } => assert_eq!(message, "attempt 5"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let attempts = Cell::new(0u32);
        let failures = Cell::new(0u32);
        let result = exponential_backoff_retry(
            || {
                attempts.set(attempts.get() + 1);
                let n = attempts.get();
                async move {
                    if n < 3 {
                        Err(Error::TransientUpload { message: "flaky".into() })
                    } else {
                        Ok("done")
                    }
                }
            },
            |_| failures.set(failures.get() + 1),
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.get(), 3);
        assert_eq!(failures.get(), 2);
    }
}
