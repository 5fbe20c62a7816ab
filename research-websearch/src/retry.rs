//! Retry wrapper for transient provider failures (spec.md §5).
//!
//! Retries are provider-internal: the [`crate::Dispatcher`] itself never
//! retries a provider, it only falls through to the next one in the
//! chain. Each raw-HTTP provider wraps its own call with [`with_retry`]
//! so that `config.per_provider_retries` only ever affects that single
//! provider's attempts, never the chain as a whole.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use research_core::{Hit, ProviderStatus};

const BASE_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(2);

/// Runs `call` and, while it reports a transient failure, retries up to
/// `max_retries` more times with jittered exponential backoff (base
/// 250 ms, cap 2 s), per spec.md §5. Any non-transient status, or the
/// final retry, is returned as-is.
pub async fn with_retry<F, Fut>(max_retries: u8, mut call: F) -> (Vec<Hit>, ProviderStatus)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = (Vec<Hit>, ProviderStatus)>,
{
    let mut attempt = 0_u8;
    loop {
        let outcome = call().await;
        if attempt >= max_retries || !is_transient(outcome.1) {
            return outcome;
        }
        tokio::time::sleep(backoff_delay(attempt)).await;
        attempt += 1;
    }
}

fn is_transient(status: ProviderStatus) -> bool {
    matches!(status, ProviderStatus::Timeout | ProviderStatus::Upstream5xx)
}

fn backoff_delay(attempt: u8) -> Duration {
    let exponential = BASE_DELAY.saturating_mul(1_u32 << attempt.min(3));
    let capped = exponential.min(MAX_DELAY);
    let jitter = rand::thread_rng().gen_range(0.5..1.0);
    capped.mul_f64(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn retries_upstream5xx_until_ok() {
        let calls = Cell::new(0);
        let (hits, status) = with_retry(2, || {
            calls.set(calls.get() + 1);
            async move {
                if calls.get() < 3 {
                    (Vec::new(), ProviderStatus::Upstream5xx)
                } else {
                    (
                        vec![Hit {
                            title: "t".into(),
                            url: "https://example.com".into(),
                            snippet: "s".into(),
                            provider_name: "p".into(),
                            published_at: None,
                        }],
                        ProviderStatus::Ok,
                    )
                }
            }
        })
        .await;

        assert_eq!(calls.get(), 3);
        assert_eq!(status, ProviderStatus::Ok);
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn stops_after_max_retries_exhausted() {
        let calls = Cell::new(0);
        let (_, status) = with_retry(2, || {
            calls.set(calls.get() + 1);
            async { (Vec::new(), ProviderStatus::Upstream5xx) }
        })
        .await;

        assert_eq!(calls.get(), 3, "one initial attempt plus two retries");
        assert_eq!(status, ProviderStatus::Upstream5xx);
    }

    #[tokio::test]
    async fn never_retries_non_transient_statuses() {
        let calls = Cell::new(0);
        let (_, status) = with_retry(2, || {
            calls.set(calls.get() + 1);
            async { (Vec::new(), ProviderStatus::AuthMissing) }
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert_eq!(status, ProviderStatus::AuthMissing);
    }

    #[test]
    fn backoff_never_exceeds_the_cap() {
        for attempt in 0..8 {
            assert!(backoff_delay(attempt) <= MAX_DELAY);
        }
    }
}
