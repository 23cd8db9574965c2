use crate::prelude::*;
use color_eyre::eyre::Report;
use homecooked_core::retry::{RetryPolicy, RetryState};
use rand::Rng;
use std::future::Future;

fn sample_jitter(policy: &RetryPolicy) -> f64 {
    let (lo, hi) = policy.jitter;
    if hi > lo {
        rand::thread_rng().gen_range(lo..hi)
    } else {
        lo
    }
}

/// Run `operation`, retrying transient failures with exponential backoff.
///
/// At most `policy.max_retries + 1` attempts are made. Errors that
/// `is_transient` rejects, and the last error once retries run out, are
/// returned unchanged.
pub async fn with_retry<T, F, Fut, C>(
    policy: &RetryPolicy,
    is_transient: C,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    C: Fn(&Report) -> bool,
{
    let mut state = RetryState::new();

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_transient(&err) || !state.can_retry(policy) {
                    return Err(err);
                }

                let delay = state.advance(policy, sample_jitter(policy));
                log::warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}",
                    state.attempt,
                    policy.max_retries + 1,
                    err,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_transient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rate_limited() -> Report {
        Error::Http {
            status: 429,
            body: "slow down".to_string(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(3);

        let result = with_retry(&policy, is_transient, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<()> = with_retry(&policy, is_transient, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Http { status: 429, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(5);

        let result: Result<()> = with_retry(&policy, is_transient, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(Error::Http {
                    status: 404,
                    body: "Not Found".to_string(),
                }
                .into())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(0);

        let result: Result<()> = with_retry(&policy, is_transient, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(2);

        let result: Result<()> = with_retry(
            &policy,
            |err: &Report| err.to_string().contains("flaky"),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(eyre!("flaky upstream")) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_sample_jitter_in_band() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let jitter = sample_jitter(&policy);
            assert!((0.5..1.5).contains(&jitter));
        }
        assert_eq!(sample_jitter(&RetryPolicy::immediate(1)), 1.0);
    }
}
