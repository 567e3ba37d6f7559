//! Error and retry-policy types for the publish domain.
//!
//! [`PublishError`] is the single failure value that crosses the engine
//! boundary. It is always returned as data and carries its own retry verdict.
//!
//! [`DeliveryError`] is what a [`crate::Deliverer`] reports; the channel
//! adapter folds it into a [`PublishError`] using the status classifier.
//!
//! [`ConfigError`] covers problems detected while assembling an engine; an
//! engine never starts with an invalid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::classify_status;
use crate::Channel;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: network failures, 5xx responses, 429 rate limiting.
/// - `NonRetryable` errors: structural content violations, other 4xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt on top of the standard
        /// schedule. `None` means the executor's own schedule applies.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

impl RetryPolicy {
    /// Returns `true` for [`RetryPolicy::Retryable`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, RetryPolicy::Retryable { .. })
    }
}

// ---------------------------------------------------------------------------
// Publish errors
// ---------------------------------------------------------------------------

/// A failed publish, validation, or delivery attempt.
///
/// Immutable once created. `retryable` is decided at the point of failure:
/// validation errors are never retryable, transport errors are retryable
/// unless their status code says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{publisher}: {message}")]
pub struct PublishError {
    /// Identifier of the publisher that failed (the channel's canonical name).
    pub publisher: String,
    /// Human-readable description of the failure.
    pub message: String,
    /// Transport status code, when the failure came from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Whether another attempt might succeed.
    pub retryable: bool,
}

impl PublishError {
    /// A structural content violation. Never retryable.
    pub fn validation(channel: Channel, message: impl Into<String>) -> Self {
        Self::terminal(channel.as_str(), message)
    }

    /// A non-retryable failure without a status code.
    pub fn terminal(publisher: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            publisher: publisher.into(),
            message: message.into(),
            status_code: None,
            retryable: false,
        }
    }

    /// A retryable failure without a status code (network errors and the like).
    pub fn transient(publisher: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            publisher: publisher.into(),
            message: message.into(),
            status_code: None,
            retryable: true,
        }
    }

    /// A failure carrying a transport status code; retryability follows
    /// [`crate::is_retryable_status`].
    pub fn from_status(publisher: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Self {
            publisher: publisher.into(),
            message: message.into(),
            status_code: Some(status_code),
            retryable: classify_status(status_code).is_retryable(),
        }
    }

    /// Returns `true` when the failure is a rate-limit response (HTTP 429).
    pub fn is_rate_limited(&self) -> bool {
        self.status_code == Some(429)
    }

    /// Derives a [`RetryPolicy`] from this error.
    ///
    /// The status classifier wins when a status code is present so that
    /// rate-limit errors report their extra delay hint.
    pub fn retry_policy(&self) -> RetryPolicy {
        match (self.retryable, self.status_code) {
            (false, _) => RetryPolicy::NonRetryable,
            (true, Some(code)) => classify_status(code),
            (true, None) => RetryPolicy::Retryable { after: None },
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::Deliverer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The platform answered with a non-success status.
    #[error("HTTP {code}: {message}")]
    Status {
        /// Transport status code.
        code: u16,
        /// Response detail, if any.
        message: String,
    },

    /// The request never produced a response (connection refused, reset, DNS).
    #[error("network error: {message}")]
    Network {
        /// Underlying transport error text.
        message: String,
    },

    /// Anything else the transport did not expect (e.g. an undecodable body).
    #[error("unexpected delivery failure: {message}")]
    Unexpected {
        /// Description of the failure.
        message: String,
    },
}

impl DeliveryError {
    /// Converts a transport failure into the boundary error for `channel`.
    ///
    /// Status failures are classified; every other failure is assumed
    /// transient.
    pub fn into_publish_error(self, channel: Channel) -> PublishError {
        match self {
            DeliveryError::Status { code, ref message } => {
                let message = if message.is_empty() {
                    format!("HTTP {code}")
                } else {
                    self.to_string()
                };
                PublishError::from_status(channel.as_str(), code, message)
            }
            other => PublishError::transient(channel.as_str(), other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Problems found while assembling a [`crate::PublishEngine`] or parsing
/// configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A channel name is not one of the canonical identifiers.
    #[error("Unknown channel: {name}")]
    UnknownChannel {
        /// The unrecognised name.
        name: String,
    },

    /// Two publishers were configured for the same channel.
    #[error("Duplicate publisher for channel: {channel}")]
    DuplicatePublisher {
        /// The channel configured twice.
        channel: Channel,
    },

    /// A publisher was configured for a channel without a constraint rule.
    #[error("Channel not supported: {channel}")]
    UnsupportedChannel {
        /// The channel lacking a rule.
        channel: Channel,
    },

    /// Any other invalid setting.
    #[error("Configuration error: {message}")]
    Invalid {
        /// Description of the configuration problem.
        message: String,
    },
}
