//! Retry orchestrator: run an async operation until success or the policy
//! says stop, with per-attempt timeouts and exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::classify::{classify, Retryability};
use super::error::{FetchError, UpstreamError};
use super::policy::RetryPolicy;

/// Progress notification handed to the caller before a backoff sleep, so it
/// can surface feedback (e.g. edit a status message).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryNotice {
    pub attempt: u32,
    pub next_attempt: u32,
    pub delay: Duration,
}

/// Callback port for retry progress. Errors returned from `on_retry` are
/// logged and swallowed; they never abort the retry loop.
#[async_trait::async_trait]
pub trait RetryObserver: Send + Sync {
    async fn on_retry(&self, notice: RetryNotice) -> crate::Result<()>;
}

/// Run `operation` under `policy`.
///
/// Each attempt races the operation against `policy.timeout`; when the timer
/// fires first the attempt future is dropped, which cancels the in-flight
/// call, and a synthesized timeout error (always retryable) takes its place.
/// Failures are classified exactly once: fatal errors surface immediately
/// with zero delay, retryable ones sleep `base_delay * 2^(attempt-1)` and
/// try again until `max_attempts` is consumed, at which point the last cause
/// is wrapped in [`FetchError::RetryExhausted`].
///
/// Attempts within one call are strictly sequential; independent calls
/// interleave freely and share no state.
pub async fn run<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
    observer: Option<&dyn RetryObserver>,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        debug!(
            label = %policy.label,
            attempt,
            max_attempts,
            "fetch attempt"
        );

        let failure = match timeout(policy.timeout, operation()).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    info!(label = %policy.label, attempts = attempt, "succeeded after retries");
                }
                return Ok(value);
            }
            Ok(Err(cause)) => match classify(&cause) {
                Retryability::Fatal => {
                    error!(
                        label = %policy.label,
                        attempt,
                        error = %cause,
                        "non-retryable error, giving up"
                    );
                    return Err(FetchError::Fatal { cause });
                }
                Retryability::Retryable => FetchError::Transient { cause },
            },
            Err(_elapsed) => {
                warn!(
                    label = %policy.label,
                    attempt,
                    limit_ms = policy.timeout.as_millis() as u64,
                    "attempt timed out"
                );
                FetchError::Timeout {
                    label: policy.label.clone(),
                    limit: policy.timeout,
                }
            }
        };

        if attempt >= max_attempts {
            error!(
                label = %policy.label,
                attempts = max_attempts,
                error = %failure,
                "all attempts exhausted"
            );
            return Err(FetchError::RetryExhausted {
                attempts: max_attempts,
                last: Box::new(failure),
            });
        }

        let delay = policy.backoff_delay(attempt);
        warn!(
            label = %policy.label,
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %failure,
            "retrying after backoff"
        );

        if let Some(obs) = observer {
            let notice = RetryNotice {
                attempt,
                next_attempt: attempt + 1,
                delay,
            };
            if let Err(e) = obs.on_retry(notice).await {
                warn!(label = %policy.label, error = %e, "retry observer failed");
            }
        }

        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use super::*;
    use crate::fetch::error::TransportCode;

    fn policy(max_attempts: u32, base_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(base_ms),
            timeout: Duration::from_secs(60),
            label: "test".to_string(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        notices: Mutex<Vec<RetryNotice>>,
    }

    #[async_trait::async_trait]
    impl RetryObserver for Recorder {
        async fn on_retry(&self, notice: RetryNotice) -> crate::Result<()> {
            self.notices.lock().unwrap().push(notice);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl RetryObserver for Failing {
        async fn on_retry(&self, _notice: RetryNotice) -> crate::Result<()> {
            Err(crate::Error::External("observer exploded".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn two_transient_failures_then_success_with_exponential_backoff() {
        // Scenario: maxAttempts=3, baseDelay=2000ms, fails twice then "OK".
        let calls = Arc::new(AtomicU32::new(0));
        let recorder = Recorder::default();
        let start = Instant::now();

        let result = run(
            &policy(3, 2000),
            || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(UpstreamError::Transport(TransportCode::TimedOut))
                    } else {
                        Ok("OK")
                    }
                }
            },
            Some(&recorder),
        )
        .await;

        assert_eq!(result.unwrap(), "OK");
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // 2000ms after attempt 1, 4000ms after attempt 2.
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(6000) && elapsed < Duration::from_millis(6100),
            "elapsed {elapsed:?}"
        );

        let notices = recorder.notices.lock().unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].attempt, 1);
        assert_eq!(notices[0].next_attempt, 2);
        assert_eq!(notices[0].delay, Duration::from_millis(2000));
        assert_eq!(notices[1].delay, Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn always_transient_exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = run(
            &policy(4, 100),
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(UpstreamError::Status(503))
                }
            },
            None,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(FetchError::RetryExhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(
                    *last,
                    FetchError::Transient {
                        cause: UpstreamError::Status(503)
                    }
                ));
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_fails_immediately_without_delay() {
        // "content not found" is fatal: exactly one attempt, zero delay.
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result: Result<(), _> = run(
            &policy(5, 2000),
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(UpstreamError::Message("content not found".to_string()))
                }
            },
            None,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(10));
        assert!(matches!(result, Err(FetchError::Fatal { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_policy_reports_retry_exhausted() {
        let result: Result<(), _> = run(
            &policy(1, 2000),
            || async { Err(UpstreamError::Transport(TransportCode::ConnectionReset)) },
            None,
        )
        .await;

        match result {
            Err(FetchError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempt_is_timed_out_and_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let p = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(100),
            timeout: Duration::from_secs(1),
            label: "slow".to_string(),
        };

        let result = run(
            &p,
            || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        // Never completes inside the attempt budget.
                        sleep(Duration::from_secs(3600)).await;
                    }
                    Ok("late but fine")
                }
            },
            None,
        )
        .await;

        assert_eq!(result.unwrap(), "late but fine");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn all_timeouts_surface_as_retry_exhausted_wrapping_timeout() {
        let p = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(100),
            timeout: Duration::from_millis(500),
            label: "stuck".to_string(),
        };

        let result: Result<(), _> = run(
            &p,
            || async {
                sleep(Duration::from_secs(3600)).await;
                Ok(())
            },
            None,
        )
        .await;

        match result {
            Err(FetchError::RetryExhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, FetchError::Timeout { .. }));
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn observer_failure_is_swallowed() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = run(
            &policy(2, 100),
            || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(UpstreamError::Status(502))
                    } else {
                        Ok(7)
                    }
                }
            },
            Some(&Failing),
        )
        .await;

        assert_eq!(result.unwrap(), 7);
    }
}
