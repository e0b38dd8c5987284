//! Request pacing and retry utilities.
//!
//! [`Cooldown`] enforces the minimum pause between outbound requests to a
//! storefront. [`retry_with_backoff`] retries transient failures (429s,
//! network errors, timeouts, 5xx) with exponential backoff and jitter.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ScraperError;

const MAX_BACKOFF_SECS: u64 = 300;

/// Returns `true` if `err` is transient and worth retrying.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) | ScraperError::Timeout { .. } => {
            true
        }
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The wait before retry `n` is `backoff_base_secs * 2^(n-1)` seconds with
/// ±25 % jitter, capped at five minutes. With `max_retries = 3` the
/// operation is attempted at most 4 times. Non-retriable errors are
/// returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay_secs = backoff_base_secs
                    .saturating_mul(1u64 << attempt.min(16))
                    .min(MAX_BACKOFF_SECS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms =
                    (delay_secs as f64 * 1000.0 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient scraper error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// Minimum interval between consecutive outbound requests.
///
/// The first call to [`Cooldown::wait`] returns immediately; later calls
/// sleep until `min_interval` has passed since the previous one returned.
/// Page fetches and image downloads share one `Cooldown`.
#[derive(Debug)]
pub struct Cooldown {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Cooldown {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        // The slot is reserved before sleeping so concurrent callers queue
        // up behind each other.
        let ready_at = {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let ready_at = last.map_or(now, |last| (last + self.min_interval).max(now));
            *last = Some(ready_at);
            ready_at
        };
        tokio::time::sleep_until(ready_at).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> ScraperError {
        ScraperError::RateLimited {
            domain: "www.amazon.com".to_owned(),
            retry_after_secs: 0,
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, ScraperError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::Timeout {
                    url: "https://www.amazon.com/dp/B08M9SMVSG".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScraperError::Timeout { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_bot_challenge() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::BotChallenge {
                    url: "https://www.amazon.com/dp/B08M9SMVSG".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::BotChallenge { .. })));
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        let status = |status| ScraperError::UnexpectedStatus {
            status,
            url: String::new(),
        };
        assert!(is_retriable(&status(503)));
        assert!(!is_retriable(&status(403)));
        assert!(!is_retriable(&ScraperError::NotFound { url: String::new() }));
    }

    #[tokio::test]
    async fn cooldown_first_wait_is_immediate() {
        let cooldown = Cooldown::new(Duration::from_secs(10));
        let started = Instant::now();
        cooldown.wait().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn cooldown_spaces_consecutive_waits() {
        let cooldown = Cooldown::new(Duration::from_millis(60));
        let started = Instant::now();
        cooldown.wait().await;
        cooldown.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn cooldown_is_shared_between_concurrent_callers() {
        let cooldown = Cooldown::new(Duration::from_millis(40));
        let started = Instant::now();
        tokio::join!(cooldown.wait(), cooldown.wait(), cooldown.wait());
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
