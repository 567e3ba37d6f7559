//! The closed set of external publishing destinations.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// A canonical external publishing destination.
///
/// Serialised in kebab-case (`"ig-carousel"`, `"x-thread"`), which is also the
/// form accepted by [`str::parse`] and produced by [`Channel::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Meta Threads text post.
    Threads,
    /// Single-image Instagram post.
    IgSingle,
    /// Multi-slide Instagram carousel.
    IgCarousel,
    /// Instagram story.
    IgStory,
    /// LinkedIn feed post.
    Linkedin,
    /// KakaoTalk channel post.
    Kakao,
    /// Long-form blog article.
    Blog,
    /// Brunch essay.
    Brunch,
    /// Medium article.
    Medium,
    /// Email newsletter issue.
    Newsletter,
    /// X (Twitter) thread made of delimited tweet segments.
    XThread,
    /// Long-form YouTube video.
    Youtube,
    /// YouTube Shorts.
    Shorts,
    /// Instagram Reels.
    Reels,
    /// TikTok video.
    Tiktok,
    /// Webtoon episode.
    Webtoon,
}

impl Channel {
    /// Every channel, in canonical order.
    pub const ALL: [Channel; 16] = [
        Channel::Threads,
        Channel::IgSingle,
        Channel::IgCarousel,
        Channel::IgStory,
        Channel::Linkedin,
        Channel::Kakao,
        Channel::Blog,
        Channel::Brunch,
        Channel::Medium,
        Channel::Newsletter,
        Channel::XThread,
        Channel::Youtube,
        Channel::Shorts,
        Channel::Reels,
        Channel::Tiktok,
        Channel::Webtoon,
    ];

    /// Returns the canonical kebab-case identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Threads => "threads",
            Channel::IgSingle => "ig-single",
            Channel::IgCarousel => "ig-carousel",
            Channel::IgStory => "ig-story",
            Channel::Linkedin => "linkedin",
            Channel::Kakao => "kakao",
            Channel::Blog => "blog",
            Channel::Brunch => "brunch",
            Channel::Medium => "medium",
            Channel::Newsletter => "newsletter",
            Channel::XThread => "x-thread",
            Channel::Youtube => "youtube",
            Channel::Shorts => "shorts",
            Channel::Reels => "reels",
            Channel::Tiktok => "tiktok",
            Channel::Webtoon => "webtoon",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownChannel {
                name: s.to_string(),
            })
    }
}
