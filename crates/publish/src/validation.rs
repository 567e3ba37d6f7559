//! Applies a [`ConstraintRule`] to a piece of content.
//!
//! Validation is pure and returns the first violation found. Every failure is
//! non-retryable: a structural violation never resolves itself on retry.

use crate::{ChannelContent, ConstraintRule, PublishError, StructuralRule};

/// Validates `content` against `rule`.
///
/// Length bounds are checked first, then the structural rule.
pub fn validate(content: &ChannelContent, rule: &ConstraintRule) -> Result<(), PublishError> {
    let fail = |message: String| Err(PublishError::validation(content.channel, message));

    let char_count = content.char_count();
    if let Some(min) = rule.min_chars {
        if char_count < min {
            return fail(format!("Content too short: {char_count} chars (minimum {min})"));
        }
    }
    if let Some(max) = rule.max_chars {
        if char_count > max {
            return fail(format!("Content too long: {char_count} chars (maximum {max})"));
        }
    }

    match &rule.structure {
        StructuralRule::None => Ok(()),
        StructuralRule::SlideCount { key, min, max } => {
            let Some(value) = content.metadata.get(key) else {
                return Ok(());
            };
            let Some(slides) = slide_count(value) else {
                return fail("Invalid slide count: expected an integer".to_string());
            };
            if slides < i128::from(*min) {
                return fail(format!("Too few slides: {slides} (minimum {min})"));
            }
            if slides > i128::from(*max) {
                return fail(format!("Too many slides: {slides} (maximum {max})"));
            }
            Ok(())
        }
        StructuralRule::Thread {
            delimiter,
            min_segments,
            max_segments,
            max_segment_chars,
        } => {
            let tweets = split_thread(&content.body, delimiter);
            let count = tweets.len();
            if count < *min_segments {
                return fail(format!("Thread too short: {count} tweets (minimum {min_segments})"));
            }
            if count > *max_segments {
                return fail(format!("Thread too long: {count} tweets (maximum {max_segments})"));
            }
            // Every segment is checked for emptiness before any is measured.
            if let Some(i) = tweets.iter().position(|tweet| tweet.is_empty()) {
                return fail(format!("Empty tweet at position {}", i + 1));
            }
            for (i, tweet) in tweets.iter().enumerate() {
                let len = tweet.chars().count();
                if len > *max_segment_chars {
                    return fail(format!(
                        "Tweet {} too long: {len} chars (maximum {max_segment_chars})",
                        i + 1
                    ));
                }
            }
            Ok(())
        }
    }
}

/// Reads a slide count from JSON.
///
/// Accepts any integer and whole-valued floats such as `5.0`.
fn slide_count(value: &serde_json::Value) -> Option<i128> {
    if let Some(n) = value.as_i64() {
        return Some(i128::from(n));
    }
    if let Some(n) = value.as_u64() {
        return Some(i128::from(n));
    }
    let f = value.as_f64()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i128)
}

/// Splits a thread body on `delimiter` and trims each segment.
///
/// Empty segments are kept so callers can report their position.
pub fn split_thread<'a>(body: &'a str, delimiter: &str) -> Vec<&'a str> {
    body.split(delimiter).map(str::trim).collect()
}
