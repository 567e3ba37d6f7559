//! Status-code classification for transports that report one.

use std::time::Duration;

use crate::RetryPolicy;

/// Extra delay hint attached to rate-limit verdicts.
///
/// Informational only; the retry executor computes the actual rate-limit
/// backoff from its own base delay.
pub const RATE_LIMIT_HINT: Duration = Duration::from_secs(4);

/// Maps a transport status code to a retry verdict.
///
/// `>= 500` and `429` are retryable; any other code is not. Success codes never
/// reach here in practice, but are treated as non-retryable for totality.
pub fn classify_status(code: u16) -> RetryPolicy {
    match code {
        429 => RetryPolicy::Retryable {
            after: Some(RATE_LIMIT_HINT),
        },
        c if c >= 500 => RetryPolicy::Retryable { after: None },
        _ => RetryPolicy::NonRetryable,
    }
}

/// Returns `true` when a failure with this status code may succeed on retry.
pub fn is_retryable_status(code: u16) -> bool {
    classify_status(code).is_retryable()
}
