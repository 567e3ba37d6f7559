//! Structured logging as an injected capability.
//!
//! The engine never reaches for a global logger. Callers hand it a
//! [`PublishLogger`]; production wiring uses [`TracingLogger`], tests use
//! [`NoopLogger`] or a recording implementation of their own.

use std::time::Duration;

use serde::Serialize;

/// Something noteworthy that happened during a publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublishEvent {
    /// Content failed validation; no attempt was made.
    Rejected {
        /// Channel name the content targeted.
        publisher: String,
        /// Rejection reason.
        message: String,
    },

    /// A delivery attempt is about to run after waiting `backoff`.
    AttemptStarted {
        /// Channel name.
        publisher: String,
        /// Zero-based attempt number.
        attempt: u32,
        /// Standard backoff waited before this attempt.
        backoff: Duration,
    },

    /// A delivery attempt failed.
    AttemptFailed {
        /// Channel name.
        publisher: String,
        /// Zero-based attempt number.
        attempt: u32,
        /// Failure description.
        message: String,
        /// Transport status, when one was received.
        status_code: Option<u16>,
        /// Whether another attempt may follow.
        retryable: bool,
    },

    /// A 429 response triggered an extra wait before the next attempt.
    RateLimited {
        /// Channel name.
        publisher: String,
        /// Zero-based attempt that was rate limited.
        attempt: u32,
        /// Wait added on top of the next standard backoff.
        extra_delay: Duration,
    },

    /// A delivery attempt succeeded.
    Succeeded {
        /// Channel name.
        publisher: String,
        /// Zero-based attempt that succeeded.
        attempt: u32,
    },

    /// Content is live on the target platform.
    Published {
        /// Channel name.
        publisher: String,
        /// Platform-assigned post identifier.
        external_id: String,
        /// Public URL of the post.
        external_url: String,
    },

    /// All attempts were used up without success.
    GaveUp {
        /// Channel name.
        publisher: String,
        /// Total attempts made.
        attempts: u32,
        /// The last failure, which is returned to the caller.
        message: String,
    },
}

/// Sink for [`PublishEvent`]s.
///
/// Implementations must be cheap and must not fail; a logger cannot change the
/// outcome of a publish call.
pub trait PublishLogger: Send + Sync {
    /// Records one event.
    fn log(&self, event: &PublishEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl PublishLogger for NoopLogger {
    fn log(&self, _event: &PublishEvent) {}
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PublishLogger for TracingLogger {
    fn log(&self, event: &PublishEvent) {
        match event {
            PublishEvent::Rejected { publisher, message } => {
                tracing::warn!(publisher = %publisher, message = %message, "content rejected");
            }
            PublishEvent::AttemptStarted {
                publisher,
                attempt,
                backoff,
            } => {
                tracing::debug!(
                    publisher = %publisher,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "delivery attempt"
                );
            }
            PublishEvent::AttemptFailed {
                publisher,
                attempt,
                message,
                status_code,
                retryable,
            } => {
                tracing::warn!(
                    publisher = %publisher,
                    attempt,
                    status_code = ?status_code,
                    retryable,
                    message = %message,
                    "delivery attempt failed"
                );
            }
            PublishEvent::RateLimited {
                publisher,
                attempt,
                extra_delay,
            } => {
                tracing::warn!(
                    publisher = %publisher,
                    attempt,
                    extra_delay_ms = extra_delay.as_millis() as u64,
                    "rate limited"
                );
            }
            PublishEvent::Succeeded { publisher, attempt } => {
                tracing::debug!(publisher = %publisher, attempt, "delivery attempt succeeded");
            }
            PublishEvent::Published {
                publisher,
                external_id,
                external_url,
            } => {
                tracing::info!(
                    publisher = %publisher,
                    external_id = %external_id,
                    external_url = %external_url,
                    "published"
                );
            }
            PublishEvent::GaveUp {
                publisher,
                attempts,
                message,
            } => {
                tracing::error!(
                    publisher = %publisher,
                    attempts,
                    message = %message,
                    "giving up after retries"
                );
            }
        }
    }
}
