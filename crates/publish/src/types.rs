//! Boundary value types exchanged with upstream and downstream collaborators.
//!
//! [`ChannelContent`] is the only input the engine accepts and
//! [`PublishResult`] the only success value it produces. Both serialise to the
//! camelCase JSON shapes used by the surrounding services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Channel, ExternalId, ExternalUrl};

/// Open key/value metadata attached to a piece of content.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Default retry ceiling for a publisher when none is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// A finished, channel-targeted content unit submitted for publishing.
///
/// Produced by an upstream generation pipeline; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContent {
    /// Destination channel.
    pub channel: Channel,
    /// Title or headline. Not length-checked.
    pub title: String,
    /// Body text; the subject of all structural constraints.
    pub body: String,
    /// Channel-specific extras (e.g. `slideCount` for carousels).
    #[serde(default)]
    pub metadata: Metadata,
}

impl ChannelContent {
    /// Creates content with empty metadata.
    pub fn new(channel: Channel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            channel,
            title: title.into(),
            body: body.into(),
            metadata: Metadata::new(),
        }
    }

    /// Adds a metadata entry, replacing any previous value for `key`.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of Unicode scalar values in the body.
    pub fn char_count(&self) -> usize {
        self.body.chars().count()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of the one delivery attempt that succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    /// Channel the content was published to.
    pub channel: Channel,
    /// Public URL of the published post.
    pub external_url: ExternalUrl,
    /// Platform-assigned post identifier.
    pub external_id: ExternalId,
    /// When the delivering attempt completed.
    pub published_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-channel publisher settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherConfig {
    /// Channel this publisher delivers to.
    pub channel: Channel,
    /// Credential forwarded to the transport, if the transport needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Retries after the first attempt; `0` means a single attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl PublisherConfig {
    /// Creates a config with no API key and the default retry ceiling.
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            api_key: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the credential passed to the deliverer.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets how many retries follow the first attempt.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

// The API key never reaches log output.
impl std::fmt::Debug for PublisherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherConfig")
            .field("channel", &self.channel)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; serialises as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp_millis(self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
