//! Retry executor behaviour: call counts, backoff schedule, and error passthrough.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{RecordingLogger, RecordingSleeper};
use publish::{PublishError, PublishEvent, RetryExecutor, DEFAULT_BASE_DELAY};

fn executor() -> (RetryExecutor, Arc<RecordingSleeper>, Arc<RecordingLogger>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let logger = Arc::new(RecordingLogger::default());
    let executor = RetryExecutor::new(DEFAULT_BASE_DELAY, sleeper.clone(), logger.clone());
    (executor, sleeper, logger)
}

/// Fails with the error produced by `fail(call)` until `succeed_on`, then
/// returns the call number.
async fn run_script(
    executor: &RetryExecutor,
    max_retries: u32,
    succeed_on: Option<u32>,
    fail: impl Fn(u32) -> PublishError,
) -> (Result<u32, PublishError>, u32) {
    let calls = AtomicU32::new(0);
    let result = executor
        .run("blog", max_retries, || {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let outcome = if Some(call) == succeed_on {
                Ok(call)
            } else {
                Err(fail(call))
            };
            async move { outcome }
        })
        .await;
    (result, calls.load(Ordering::SeqCst))
}

// -------------------------------------------------------------------------
// Call counts
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_first_call_success_runs_once_without_sleeping() {
    let (executor, sleeper, _) = executor();
    let (result, calls) = run_script(&executor, 3, Some(1), |_| unreachable!()).await;
    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls, 1);
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_non_retryable_failure_runs_once() {
    for max_retries in [0, 1, 3, 10] {
        let (executor, sleeper, _) = executor();
        let (result, calls) = run_script(&executor, max_retries, None, |_| {
            PublishError::from_status("blog", 401, "bad key")
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(calls, 1, "max_retries = {max_retries}");
        assert_eq!(err.status_code, Some(401));
        assert!(sleeper.sleeps().is_empty());
    }
}

#[tokio::test]
async fn test_retryable_failure_runs_max_retries_plus_one() {
    for max_retries in [0, 1, 2, 4] {
        let (executor, _, _) = executor();
        let (result, calls) = run_script(&executor, max_retries, None, |call| {
            PublishError::transient("blog", format!("failure {call}"))
        })
        .await;
        assert_eq!(calls, max_retries + 1);
        assert_eq!(
            result.unwrap_err(),
            PublishError::transient("blog", format!("failure {}", max_retries + 1))
        );
    }
}

#[tokio::test]
async fn test_zero_retries_means_single_attempt() {
    let (executor, sleeper, _) = executor();
    let (result, calls) = run_script(&executor, 0, None, |_| {
        PublishError::from_status("blog", 503, "unavailable")
    })
    .await;
    assert_eq!(calls, 1);
    assert!(result.is_err());
    assert!(sleeper.sleeps().is_empty());
}

// -------------------------------------------------------------------------
// Backoff schedule
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_scenario_e_succeeds_on_third_call() {
    let (executor, sleeper, _) = executor();
    let (result, calls) = run_script(&executor, 2, Some(3), |_| {
        PublishError::transient("blog", "timeout")
    })
    .await;
    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls, 3);
    assert_eq!(sleeper.sleeps_ms(), vec![1000, 2000]);
}

#[tokio::test]
async fn test_exhaustion_backoff_doubles() {
    let (executor, sleeper, _) = executor();
    let _ = run_script(&executor, 4, None, |_| {
        PublishError::from_status("blog", 500, "boom")
    })
    .await;
    assert_eq!(sleeper.sleeps_ms(), vec![1000, 2000, 4000, 8000]);
}

#[tokio::test]
async fn test_rate_limit_adds_extra_delay_between_attempts() {
    let (executor, sleeper, _) = executor();
    let (result, calls) = run_script(&executor, 3, None, |_| {
        PublishError::from_status("blog", 429, "too many requests")
    })
    .await;
    assert_eq!(calls, 4);
    assert_eq!(result.unwrap_err().status_code, Some(429));
    // Extra 429 waits stack with the standard backoff; none after the last attempt.
    assert_eq!(sleeper.sleeps_ms(), vec![4000, 1000, 8000, 2000, 16000, 4000]);
}

#[tokio::test]
async fn test_rate_limit_on_final_attempt_does_not_sleep() {
    let (executor, sleeper, _) = executor();
    let _ = run_script(&executor, 0, None, |_| {
        PublishError::from_status("blog", 429, "too many requests")
    })
    .await;
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_custom_base_delay_scales_schedule() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let executor = RetryExecutor::new(
        Duration::from_millis(10),
        sleeper.clone(),
        Arc::new(publish::NoopLogger),
    );
    let _ = run_script(&executor, 3, None, |_| PublishError::transient("blog", "x")).await;
    assert_eq!(sleeper.sleeps_ms(), vec![10, 20, 40]);
}

#[tokio::test]
async fn test_mixed_failures_return_last_error() {
    let (executor, _, _) = executor();
    let (result, calls) = run_script(&executor, 2, None, |call| match call {
        1 => PublishError::from_status("blog", 503, "unavailable"),
        2 => PublishError::from_status("blog", 429, "slow down"),
        _ => PublishError::transient("blog", "connection reset"),
    })
    .await;
    assert_eq!(calls, 3);
    assert_eq!(result.unwrap_err().message, "connection reset");
}

// -------------------------------------------------------------------------
// Logging
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_executor_logs_attempts_and_give_up() {
    let (executor, _, logger) = executor();
    let _ = run_script(&executor, 1, None, |_| {
        PublishError::from_status("blog", 502, "bad gateway")
    })
    .await;
    let events = logger.events();
    assert_eq!(
        events.first(),
        Some(&PublishEvent::AttemptStarted {
            publisher: "blog".into(),
            attempt: 0,
            backoff: Duration::ZERO,
        })
    );
    assert_eq!(
        events.last(),
        Some(&PublishEvent::GaveUp {
            publisher: "blog".into(),
            attempts: 2,
            message: "bad gateway".into(),
        })
    );
    let failures = events
        .iter()
        .filter(|e| matches!(e, PublishEvent::AttemptFailed { .. }))
        .count();
    assert_eq!(failures, 2);
}
