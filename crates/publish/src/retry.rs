//! Backoff-driven attempt loop, independent of any channel.
//!
//! ## Schedule
//!
//! For `attempt` in `0..=max_retries`:
//!
//! 1. if `attempt > 0`, wait [`backoff_delay`] (`base * 2^(attempt-1)`);
//! 2. invoke the delivery function;
//! 3. success is returned immediately;
//! 4. a non-retryable failure is returned immediately;
//! 5. a 429 failure with attempts remaining waits an extra
//!    [`rate_limit_delay`] (`base * 2^(attempt+2)`) on top of the next
//!    iteration's standard backoff.
//!
//! Exhaustion returns the last recorded failure. Attempts are strictly
//! sequential so the same content is never in flight twice.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{NoopLogger, PublishError, PublishEvent, PublishLogger};

/// Default base delay of the exponential schedule.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

// ---------------------------------------------------------------------------
// Sleeping
// ---------------------------------------------------------------------------

/// Suspends the current task; the only timer the executor uses.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

fn scaled(base: Duration, exponent: u32) -> Duration {
    2u32.checked_pow(exponent)
        .map_or(Duration::MAX, |factor| base.saturating_mul(factor))
}

/// Standard wait before `attempt` (zero for the first attempt).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    if attempt == 0 {
        Duration::ZERO
    } else {
        scaled(base, attempt - 1)
    }
}

/// Extra wait after a rate-limited `attempt`.
pub fn rate_limit_delay(base: Duration, attempt: u32) -> Duration {
    scaled(base, attempt.saturating_add(2))
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Runs a delivery function under the backoff schedule.
///
/// Holds no per-call state; one executor may serve any number of concurrent
/// calls.
#[derive(Clone)]
pub struct RetryExecutor {
    base_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
    logger: Arc<dyn PublishLogger>,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, Arc::new(TokioSleeper), Arc::new(NoopLogger))
    }
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    /// Creates an executor with an explicit timer and event sink.
    pub fn new(
        base_delay: Duration,
        sleeper: Arc<dyn Sleeper>,
        logger: Arc<dyn PublishLogger>,
    ) -> Self {
        Self {
            base_delay,
            sleeper,
            logger,
        }
    }

    /// Base of the exponential schedule.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Sink receiving attempt events.
    pub fn logger(&self) -> &Arc<dyn PublishLogger> {
        &self.logger
    }

    /// Calls `deliver` up to `max_retries + 1` times.
    ///
    /// `publisher` only labels log events and the fallback error.
    pub async fn run<T, F, Fut>(
        &self,
        publisher: &str,
        max_retries: u32,
        mut deliver: F,
    ) -> Result<T, PublishError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PublishError>>,
    {
        let mut last_error: Option<PublishError> = None;

        for attempt in 0..=max_retries {
            let backoff = backoff_delay(self.base_delay, attempt);
            if attempt > 0 {
                self.sleeper.sleep(backoff).await;
            }
            self.logger.log(&PublishEvent::AttemptStarted {
                publisher: publisher.to_string(),
                attempt,
                backoff,
            });

            let err = match deliver().await {
                Ok(value) => {
                    self.logger.log(&PublishEvent::Succeeded {
                        publisher: publisher.to_string(),
                        attempt,
                    });
                    return Ok(value);
                }
                Err(err) => err,
            };

            self.logger.log(&PublishEvent::AttemptFailed {
                publisher: publisher.to_string(),
                attempt,
                message: err.message.clone(),
                status_code: err.status_code,
                retryable: err.retryable,
            });
            if !err.retryable {
                return Err(err);
            }

            // Stacks with the next iteration's standard backoff.
            if err.is_rate_limited() && attempt < max_retries {
                let extra_delay = rate_limit_delay(self.base_delay, attempt);
                self.logger.log(&PublishEvent::RateLimited {
                    publisher: publisher.to_string(),
                    attempt,
                    extra_delay,
                });
                self.sleeper.sleep(extra_delay).await;
            }
            last_error = Some(err);
        }

        let err = last_error
            .unwrap_or_else(|| PublishError::terminal(publisher, "max retries exceeded"));
        self.logger.log(&PublishEvent::GaveUp {
            publisher: publisher.to_string(),
            attempts: max_retries.saturating_add(1),
            message: err.message.clone(),
        });
        Err(err)
    }
}

/// Runs `deliver` with the default executor (1 s base delay, tokio timer, no
/// logging).
pub async fn with_retry<T, F, Fut>(deliver: F, max_retries: u32) -> Result<T, PublishError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PublishError>>,
{
    RetryExecutor::default().run("retry", max_retries, deliver).await
}
