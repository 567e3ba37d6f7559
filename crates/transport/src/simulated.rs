//! Simulated delivery: fixed latency, synthesised identifiers.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use publish::{
    split_thread, Channel, Deliverer, DeliveryError, DeliveryRequest, ExternalId, ExternalUrl,
    PublishResult, Timestamp, THREAD_DELIMITER,
};
use tokio::sync::Mutex;

/// Round-trip time of a simulated delivery.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);

/// Public URL of a post on `channel` with identifier `id`.
pub fn external_url(channel: Channel, id: &str) -> String {
    match channel {
        Channel::Blog => format!("https://blog.example.com/posts/{id}"),
        Channel::IgSingle | Channel::IgCarousel | Channel::IgStory | Channel::Reels => {
            format!("https://www.instagram.com/p/{id}")
        }
        Channel::Threads => format!("https://www.threads.net/@me/post/{id}"),
        Channel::Linkedin => format!("https://www.linkedin.com/feed/update/{id}"),
        Channel::Kakao => format!("https://pf.kakao.com/_me/{id}"),
        Channel::Brunch => format!("https://brunch.co.kr/@me/{id}"),
        Channel::Medium => format!("https://medium.com/@me/{id}"),
        Channel::Newsletter => format!("https://newsletter.example.com/issues/{id}"),
        Channel::XThread => format!("https://x.com/i/status/{id}"),
        Channel::Youtube | Channel::Shorts => format!("https://www.youtube.com/watch?v={id}"),
        Channel::Tiktok => format!("https://www.tiktok.com/@me/video/{id}"),
        Channel::Webtoon => format!("https://webtoon.example.com/episodes/{id}"),
    }
}

/// Pretends to publish; never touches the network.
///
/// Failures queued with [`SimulatedDeliverer::with_failures`] are returned one
/// per call, in order, before the deliverer starts succeeding.
#[derive(Debug)]
pub struct SimulatedDeliverer {
    latency: Duration,
    failures: Mutex<VecDeque<DeliveryError>>,
}

impl Default for SimulatedDeliverer {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

impl SimulatedDeliverer {
    /// Creates a deliverer that always succeeds after `latency`.
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Queues failures to return, one per call, before succeeding.
    #[must_use]
    pub fn with_failures(self, failures: impl IntoIterator<Item = DeliveryError>) -> Self {
        Self {
            failures: Mutex::new(failures.into_iter().collect()),
            ..self
        }
    }

    /// Simulated round-trip time.
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl Deliverer for SimulatedDeliverer {
    async fn deliver(&self, request: DeliveryRequest<'_>) -> Result<PublishResult, DeliveryError> {
        let channel = request.content.channel;
        tokio::time::sleep(self.latency).await;

        if let Some(err) = self.failures.lock().await.pop_front() {
            tracing::debug!(channel = %channel, error = %err, "simulated delivery failure");
            return Err(err);
        }

        if channel == Channel::XThread {
            let tweets = split_thread(&request.content.body, THREAD_DELIMITER);
            tracing::debug!(channel = %channel, tweets = tweets.len(), "posting thread");
        }

        let published_at = Timestamp::now();
        let id = format!("{channel}-{}", published_at.timestamp_millis());
        let external_url = ExternalUrl::new(external_url(channel, &id)).ok_or_else(|| {
            DeliveryError::Unexpected {
                message: "empty external URL".to_string(),
            }
        })?;
        let external_id = ExternalId::new(id).ok_or_else(|| DeliveryError::Unexpected {
            message: "empty external id".to_string(),
        })?;

        Ok(PublishResult {
            channel,
            external_url,
            external_id,
            published_at,
        })
    }
}
