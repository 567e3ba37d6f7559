//! Port trait for the platform-specific delivery call.
//!
//! The domain never talks to a network. A [`Deliverer`] implementation lives
//! in the `transport` crate (simulated or HTTP-backed) and is injected into
//! the engine at composition time.

use async_trait::async_trait;

use crate::{ChannelContent, DeliveryError, PublishResult};

/// Everything a transport needs for one delivery attempt.
#[derive(Clone, Copy)]
pub struct DeliveryRequest<'a> {
    /// Content being published; already validated.
    pub content: &'a ChannelContent,
    /// Credential configured for the channel's publisher.
    pub api_key: Option<&'a str>,
}

impl std::fmt::Debug for DeliveryRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryRequest")
            .field("channel", &self.content.channel)
            .field("api_key", &self.api_key.map(|_| "<redacted>"))
            .finish()
    }
}

/// Performs one delivery attempt.
///
/// Called at most once per attempt; the retry executor decides whether to
/// call again. Implementations must be safe to call concurrently for
/// different channels.
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Publishes `request.content`, returning the platform's identifiers.
    async fn deliver(&self, request: DeliveryRequest<'_>) -> Result<PublishResult, DeliveryError>;
}
