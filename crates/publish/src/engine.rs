//! Channel adapters and the engine that routes content to them.
//!
//! There is one generic [`ChannelAdapter`] type; what differs between
//! channels is data (its [`ConstraintRule`] and [`PublisherConfig`]), not
//! code. [`PublishEngine`] owns one adapter per configured channel and
//! dispatches each [`ChannelContent`] by its `channel` field.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tracing::Instrument;

use crate::{
    Channel, ChannelContent, ConfigError, ConstraintRegistry, ConstraintRule, Deliverer,
    DeliveryRequest, NoopLogger, PublishError, PublishEvent, PublishLogger, PublishResult,
    PublishRunId, PublisherConfig, RetryExecutor, Sleeper, TokioSleeper, DEFAULT_BASE_DELAY,
};

// ---------------------------------------------------------------------------
// Channel adapter
// ---------------------------------------------------------------------------

/// Validator + deliverer for one channel, driven through the retry executor.
///
/// Immutable after construction; safe to share across tasks.
pub struct ChannelAdapter {
    config: PublisherConfig,
    rule: ConstraintRule,
    deliverer: Arc<dyn Deliverer>,
    executor: RetryExecutor,
}

impl std::fmt::Debug for ChannelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelAdapter")
            .field("config", &self.config)
            .field("rule", &self.rule)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl ChannelAdapter {
    /// Builds an adapter; `rule` must be the rule for `config.channel`.
    pub fn new(
        config: PublisherConfig,
        rule: ConstraintRule,
        deliverer: Arc<dyn Deliverer>,
        executor: RetryExecutor,
    ) -> Self {
        Self {
            config,
            rule,
            deliverer,
            executor,
        }
    }

    /// Channel this adapter publishes to.
    pub fn channel(&self) -> Channel {
        self.config.channel
    }

    /// Publisher settings (API key, retry budget).
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Constraint rule applied before every publish.
    pub fn rule(&self) -> &ConstraintRule {
        &self.rule
    }

    /// Checks that `content` targets this adapter's channel and satisfies its
    /// rule. Performs no delivery.
    pub fn validate(&self, content: &ChannelContent) -> Result<(), PublishError> {
        if content.channel != self.channel() {
            return Err(PublishError::validation(
                self.channel(),
                format!(
                    "Channel mismatch: adapter for {} received {}",
                    self.channel(),
                    content.channel
                ),
            ));
        }
        crate::validate(content, &self.rule)
    }

    /// Validates once, then delivers under the retry policy.
    pub async fn publish(&self, content: &ChannelContent) -> Result<PublishResult, PublishError> {
        let run_id = PublishRunId::new_random();
        let span = tracing::info_span!(
            "publish",
            channel = %self.channel(),
            run_id = %run_id,
            max_retries = self.config.max_retries
        );
        self.publish_validated(content).instrument(span).await
    }

    async fn publish_validated(
        &self,
        content: &ChannelContent,
    ) -> Result<PublishResult, PublishError> {
        let logger = self.executor.logger();
        if let Err(err) = self.validate(content) {
            logger.log(&PublishEvent::Rejected {
                publisher: err.publisher.clone(),
                message: err.message.clone(),
            });
            return Err(err);
        }

        let result = self
            .executor
            .run(self.channel().as_str(), self.config.max_retries, || {
                self.deliver_once(content)
            })
            .await?;

        logger.log(&PublishEvent::Published {
            publisher: self.channel().to_string(),
            external_id: result.external_id.to_string(),
            external_url: result.external_url.to_string(),
        });
        Ok(result)
    }

    /// One delivery attempt. A panicking deliverer is reported as a
    /// transient failure instead of unwinding through the caller.
    async fn deliver_once(&self, content: &ChannelContent) -> Result<PublishResult, PublishError> {
        let request = DeliveryRequest {
            content,
            api_key: self.config.api_key.as_deref(),
        };
        match AssertUnwindSafe(self.deliverer.deliver(request))
            .catch_unwind()
            .await
        {
            Ok(result) => result.map_err(|err| err.into_publish_error(self.channel())),
            Err(payload) => Err(PublishError::transient(
                self.channel().as_str(),
                format!("deliverer panicked: {}", panic_message(payload.as_ref())),
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Routes content to the adapter for its channel.
pub struct PublishEngine {
    registry: ConstraintRegistry,
    adapters: BTreeMap<Channel, ChannelAdapter>,
    logger: Arc<dyn PublishLogger>,
}

impl std::fmt::Debug for PublishEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishEngine")
            .field("registry", &self.registry)
            .field("adapters", &self.adapters)
            .finish_non_exhaustive()
    }
}

impl PublishEngine {
    /// Starts a [`PublishEngineBuilder`] with default settings.
    pub fn builder() -> PublishEngineBuilder {
        PublishEngineBuilder::default()
    }

    /// Constraint rules known to this engine.
    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    /// Channels with a configured publisher, in canonical order.
    pub fn channels(&self) -> Vec<Channel> {
        self.adapters.keys().copied().collect()
    }

    /// Adapter for `channel`, if a publisher is configured.
    pub fn adapter(&self, channel: Channel) -> Option<&ChannelAdapter> {
        self.adapters.get(&channel)
    }

    /// Runs only the validator for `content`.
    pub fn validate(&self, content: &ChannelContent) -> Result<(), PublishError> {
        self.registry.validate(content)
    }

    /// Publishes `content` to its channel.
    pub async fn publish(&self, content: &ChannelContent) -> Result<PublishResult, PublishError> {
        match self.adapters.get(&content.channel) {
            Some(adapter) => adapter.publish(content).await,
            None => {
                let message = if self.registry.supports(content.channel) {
                    format!("No publisher configured for channel: {}", content.channel)
                } else {
                    format!("Channel not supported: {}", content.channel)
                };
                let err = PublishError::validation(content.channel, message);
                self.logger.log(&PublishEvent::Rejected {
                    publisher: err.publisher.clone(),
                    message: err.message.clone(),
                });
                Err(err)
            }
        }
    }

    /// Publishes a batch concurrently; results keep the input order.
    ///
    /// Items for the same channel are independent calls and may overlap.
    pub async fn publish_all(
        &self,
        contents: &[ChannelContent],
    ) -> Vec<Result<PublishResult, PublishError>> {
        join_all(contents.iter().map(|content| self.publish(content))).await
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`PublishEngine`].
///
/// Defaults: the standard registry, a 1 s base delay, the tokio timer, no
/// logging, and (when no publisher is added) one default publisher per
/// supported channel. A deliverer is required.
pub struct PublishEngineBuilder {
    registry: ConstraintRegistry,
    deliverer: Option<Arc<dyn Deliverer>>,
    sleeper: Arc<dyn Sleeper>,
    logger: Arc<dyn PublishLogger>,
    base_delay: Duration,
    publishers: Vec<PublisherConfig>,
}

impl Default for PublishEngineBuilder {
    fn default() -> Self {
        Self {
            registry: ConstraintRegistry::standard(),
            deliverer: None,
            sleeper: Arc::new(TokioSleeper),
            logger: Arc::new(NoopLogger),
            base_delay: DEFAULT_BASE_DELAY,
            publishers: Vec::new(),
        }
    }
}

impl PublishEngineBuilder {
    /// Replaces the constraint registry.
    #[must_use]
    pub fn registry(mut self, registry: ConstraintRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the deliverer shared by every adapter. Required.
    #[must_use]
    pub fn deliverer(mut self, deliverer: Arc<dyn Deliverer>) -> Self {
        self.deliverer = Some(deliverer);
        self
    }

    /// Overrides the timer used between attempts.
    #[must_use]
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn logger(mut self, logger: Arc<dyn PublishLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Sets the base of the exponential backoff.
    #[must_use]
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Adds one publisher.
    #[must_use]
    pub fn publisher(mut self, config: PublisherConfig) -> Self {
        self.publishers.push(config);
        self
    }

    /// Adds several publishers.
    #[must_use]
    pub fn publishers(mut self, configs: impl IntoIterator<Item = PublisherConfig>) -> Self {
        self.publishers.extend(configs);
        self
    }

    /// Assembles the engine.
    ///
    /// Fails without a deliverer, for a channel the registry has no rule for,
    /// or when two publishers target the same channel.
    pub fn build(self) -> Result<PublishEngine, ConfigError> {
        let deliverer = self.deliverer.ok_or_else(|| ConfigError::Invalid {
            message: "no deliverer configured".to_string(),
        })?;
        let executor = RetryExecutor::new(self.base_delay, self.sleeper, Arc::clone(&self.logger));

        let publishers = if self.publishers.is_empty() {
            self.registry
                .channels()
                .into_iter()
                .map(PublisherConfig::new)
                .collect()
        } else {
            self.publishers
        };

        let mut adapters = BTreeMap::new();
        for config in publishers {
            let channel = config.channel;
            let rule = self
                .registry
                .rule(channel)
                .cloned()
                .ok_or(ConfigError::UnsupportedChannel { channel })?;
            if adapters.contains_key(&channel) {
                return Err(ConfigError::DuplicatePublisher { channel });
            }
            let adapter = ChannelAdapter::new(config, rule, Arc::clone(&deliverer), executor.clone());
            adapters.insert(channel, adapter);
        }

        Ok(PublishEngine {
            registry: self.registry,
            adapters,
            logger: self.logger,
        })
    }
}
