//! Per-channel structural validity rules.
//!
//! The registry is built once at process start and never mutated afterwards.
//! Channels without a rule cannot be published to; adding one is a matter of
//! registering a [`ConstraintRule`] and nothing else in the engine changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Channel, ChannelContent, PublishError};

/// Delimiter separating the tweets of an x-thread body.
pub const THREAD_DELIMITER: &str = "\n\n---\n\n";

/// Metadata key holding a carousel's slide count.
pub const SLIDE_COUNT_KEY: &str = "slideCount";

/// Channel-specific shape rule applied after the length bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralRule {
    /// No shape rule beyond the length bounds.
    None,

    /// An integer slide count read from metadata must lie in `[min, max]`.
    /// An absent key skips the check.
    SlideCount {
        /// Metadata key holding the count.
        key: String,
        /// Smallest permitted count.
        min: i64,
        /// Largest permitted count.
        max: i64,
    },

    /// The body is a sequence of segments separated by `delimiter`.
    Thread {
        /// Literal separator between segments.
        delimiter: String,
        /// Fewest segments permitted.
        min_segments: usize,
        /// Most segments permitted.
        max_segments: usize,
        /// Per-segment character ceiling, measured after trimming.
        max_segment_chars: usize,
    },
}

/// Structural constraints for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRule {
    /// Minimum body length in characters, if bounded.
    pub min_chars: Option<usize>,
    /// Maximum body length in characters, if bounded.
    pub max_chars: Option<usize>,
    /// Additional shape rule.
    pub structure: StructuralRule,
}

impl ConstraintRule {
    /// A plain inclusive length bound.
    pub fn length(min_chars: usize, max_chars: usize) -> Self {
        Self {
            min_chars: Some(min_chars),
            max_chars: Some(max_chars),
            structure: StructuralRule::None,
        }
    }

    /// A segmented thread without overall length bounds.
    pub fn thread(min_segments: usize, max_segments: usize, max_segment_chars: usize) -> Self {
        Self {
            min_chars: None,
            max_chars: None,
            structure: StructuralRule::Thread {
                delimiter: THREAD_DELIMITER.to_string(),
                min_segments,
                max_segments,
                max_segment_chars,
            },
        }
    }

    /// Adds a slide-count bound read from [`SLIDE_COUNT_KEY`].
    #[must_use]
    pub fn with_slide_count(mut self, min: i64, max: i64) -> Self {
        self.structure = StructuralRule::SlideCount {
            key: SLIDE_COUNT_KEY.to_string(),
            min,
            max,
        };
        self
    }

    /// One-line human summary, e.g. `"300-2200 chars, 1-10 slides"`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        match (self.min_chars, self.max_chars) {
            (Some(min), Some(max)) => parts.push(format!("{min}-{max} chars")),
            (Some(min), None) => parts.push(format!(">= {min} chars")),
            (None, Some(max)) => parts.push(format!("<= {max} chars")),
            (None, None) => {}
        }
        match &self.structure {
            StructuralRule::None => {}
            StructuralRule::SlideCount { min, max, .. } => {
                parts.push(format!("{min}-{max} slides"));
            }
            StructuralRule::Thread {
                min_segments,
                max_segments,
                max_segment_chars,
                ..
            } => {
                parts.push(format!(
                    "{min_segments}-{max_segments} tweets of <= {max_segment_chars} chars"
                ));
            }
        }
        if parts.is_empty() {
            "unconstrained".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Mapping from channel to its [`ConstraintRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintRegistry {
    rules: BTreeMap<Channel, ConstraintRule>,
}

impl ConstraintRegistry {
    /// A registry with no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rules observed on the live platforms.
    ///
    /// Video and story channels are not yet publishable and carry no rule.
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(Channel::Threads, ConstraintRule::length(100, 500))
            .with_rule(Channel::IgSingle, ConstraintRule::length(100, 2200))
            .with_rule(
                Channel::IgCarousel,
                ConstraintRule::length(300, 2200).with_slide_count(1, 10),
            )
            .with_rule(Channel::Linkedin, ConstraintRule::length(300, 800))
            .with_rule(Channel::Kakao, ConstraintRule::length(200, 2000))
            .with_rule(Channel::Blog, ConstraintRule::length(1500, 15000))
            .with_rule(Channel::Brunch, ConstraintRule::length(2000, 5000))
            .with_rule(Channel::Medium, ConstraintRule::length(2000, 4000))
            .with_rule(Channel::Newsletter, ConstraintRule::length(1000, 20000))
            .with_rule(Channel::XThread, ConstraintRule::thread(5, 15, 280))
    }

    /// Registers `rule` for `channel`, replacing any existing rule.
    #[must_use]
    pub fn with_rule(mut self, channel: Channel, rule: ConstraintRule) -> Self {
        self.rules.insert(channel, rule);
        self
    }

    /// Returns the rule for `channel`, if the channel is supported.
    pub fn rule(&self, channel: Channel) -> Option<&ConstraintRule> {
        self.rules.get(&channel)
    }

    /// Returns `true` if `channel` has a rule.
    pub fn supports(&self, channel: Channel) -> bool {
        self.rules.contains_key(&channel)
    }

    /// Supported channels, in canonical order.
    pub fn channels(&self) -> Vec<Channel> {
        self.rules.keys().copied().collect()
    }

    /// Validates `content` against the rule for its own channel.
    ///
    /// Fails with a non-retryable error when the channel has no rule.
    pub fn validate(&self, content: &ChannelContent) -> Result<(), PublishError> {
        let rule = self.rule(content.channel).ok_or_else(|| {
            PublishError::validation(
                content.channel,
                format!("Channel not supported: {}", content.channel),
            )
        })?;
        crate::validate(content, rule)
    }
}
