//! Retry with exponential back-off and jitter for the eBay client.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 5xx, 429). Non-transient errors —
//! auth rejections, deserialization failures — are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::EbayError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - HTTP 5xx responses: transient server/infrastructure errors.
/// - [`EbayError::RateLimited`]: the API asked us to slow down.
///
/// **Not retriable (hard stop):**
/// - [`EbayError::Auth`] — bad credentials; retrying won't fix it.
/// - [`EbayError::Deserialize`] — malformed response; retrying won't fix it.
/// - [`EbayError::UnexpectedStatus`] with a 4xx — application errors.
/// - [`EbayError::InvalidBaseUrl`] — configuration error.
pub fn is_retriable(err: &EbayError) -> bool {
    match err {
        EbayError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        EbayError::RateLimited { .. } => true,
        EbayError::UnexpectedStatus { status, .. } => (500..=599).contains(status),
        EbayError::Auth(_) | EbayError::Deserialize { .. } | EbayError::InvalidBaseUrl(_) => {
            false
        }
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 1 000 ms × 2² ± 25 % jitter     |
///
/// A `Retry-After` hint from a 429 overrides the computed delay. Delay is
/// capped at 60 s. Non-retriable errors are returned immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, EbayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EbayError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = match err {
                    EbayError::RateLimited {
                        retry_after_secs: Some(secs),
                    } => secs.saturating_mul(1_000),
                    _ => backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10)),
                };
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "eBay transient error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deserialize_err() -> EbayError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        EbayError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn auth_error_is_not_retriable() {
        assert!(!is_retriable(&EbayError::Auth("bad creds".to_owned())));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn unexpected_status_4xx_is_not_retriable() {
        assert!(!is_retriable(&EbayError::UnexpectedStatus {
            status: 400,
            url: "https://api.ebay.com".to_owned(),
        }));
    }

    #[test]
    fn unexpected_status_5xx_is_retriable() {
        assert!(is_retriable(&EbayError::UnexpectedStatus {
            status: 503,
            url: "https://api.ebay.com".to_owned(),
        }));
    }

    #[test]
    fn rate_limited_is_retriable() {
        assert!(is_retriable(&EbayError::RateLimited {
            retry_after_secs: Some(2),
        }));
        assert!(is_retriable(&EbayError::RateLimited {
            retry_after_secs: None,
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, EbayError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_auth_error() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(EbayError::Auth("invalid client".to_owned()))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "Auth must not be retried");
        assert!(matches!(result, Err(EbayError::Auth(_))));
    }

    #[tokio::test]
    async fn retries_rate_limited_then_succeeds() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err::<u32, _>(EbayError::RateLimited {
                        retry_after_secs: None,
                    })
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99, "should succeed after retries");
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "should have been called 3 times (2 failures + 1 success)"
        );
    }

    #[tokio::test]
    async fn exhausts_retries_and_returns_last_error() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(EbayError::RateLimited {
                    retry_after_secs: None,
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "initial try + 2 retries");
        assert!(matches!(result, Err(EbayError::RateLimited { .. })));
    }
}
