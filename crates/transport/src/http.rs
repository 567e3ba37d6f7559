//! HTTP delivery through a publishing gateway.
//!
//! Each attempt is one `POST {endpoint}/channels/{channel}/posts`. The gateway
//! answers `2xx` with `{ "externalId", "externalUrl" }`; any other status is
//! reported as [`DeliveryError::Status`] and classified by the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use publish::{
    split_thread, Channel, Deliverer, DeliveryError, DeliveryRequest, ExternalId, ExternalUrl,
    Metadata, PublishResult, Timestamp, THREAD_DELIMITER,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing an [`HttpDeliverer`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint is not an absolute `http(s)` URL.
    #[error("invalid gateway endpoint: {endpoint}")]
    InvalidEndpoint {
        /// The rejected value.
        endpoint: String,
    },

    /// The HTTP client could not be built (e.g. TLS backend failure).
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct PostRequest<'a> {
    title: &'a str,
    body: &'a str,
    metadata: &'a Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    segments: Option<Vec<&'a str>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostResponse {
    external_id: String,
    external_url: String,
}

/// [`Deliverer`] backed by a JSON-over-HTTP publishing gateway.
#[derive(Debug, Clone)]
pub struct HttpDeliverer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDeliverer {
    /// Creates a deliverer posting to `endpoint` with a per-request `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(TransportError::InvalidEndpoint { endpoint });
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Gateway base URL without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn post_url(&self, channel: Channel) -> String {
        format!("{}/channels/{channel}/posts", self.endpoint)
    }
}

#[async_trait]
impl Deliverer for HttpDeliverer {
    async fn deliver(&self, request: DeliveryRequest<'_>) -> Result<PublishResult, DeliveryError> {
        let content = request.content;
        let segments = (content.channel == Channel::XThread)
            .then(|| split_thread(&content.body, THREAD_DELIMITER));
        let payload = PostRequest {
            title: &content.title,
            body: &content.body,
            metadata: &content.metadata,
            segments,
        };

        let mut builder = self.client.post(self.post_url(content.channel)).json(&payload);
        if let Some(api_key) = request.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| DeliveryError::Network {
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            // The body is diagnostic only; a failure to read it is not worth reporting.
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(channel = %content.channel, status = status.as_u16(), "gateway rejected post");
            return Err(DeliveryError::Status {
                code: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let parsed: PostResponse = response.json().await.map_err(|e| DeliveryError::Unexpected {
            message: format!("invalid gateway response: {e}"),
        })?;
        let external_id = ExternalId::new(parsed.external_id).ok_or_else(|| DeliveryError::Unexpected {
            message: "gateway returned an empty externalId".to_string(),
        })?;
        let external_url = ExternalUrl::new(parsed.external_url).ok_or_else(|| DeliveryError::Unexpected {
            message: "gateway returned an empty externalUrl".to_string(),
        })?;

        Ok(PublishResult {
            channel: content.channel,
            external_url,
            external_id,
            published_at: Timestamp::now(),
        })
    }
}
