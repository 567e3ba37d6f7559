//! Recording test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use publish::{
    Channel, ChannelContent, Deliverer, DeliveryError, DeliveryRequest, ExternalId, ExternalUrl,
    PublishEngine, PublishEvent, PublishLogger, PublishResult, PublisherConfig, Sleeper,
    Timestamp,
};

/// Records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn sleeps_ms(&self) -> Vec<u128> {
        self.sleeps().iter().map(Duration::as_millis).collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Keeps every event it receives.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<PublishEvent>>,
}

impl RecordingLogger {
    pub fn events(&self) -> Vec<PublishEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PublishLogger for RecordingLogger {
    fn log(&self, event: &PublishEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Plays back a fixed list of outcomes, then succeeds forever.
#[derive(Default)]
pub struct ScriptedDeliverer {
    script: Mutex<VecDeque<DeliveryError>>,
    calls: AtomicU32,
    panics: AtomicU32,
    api_keys: Mutex<Vec<Option<String>>>,
}

impl ScriptedDeliverer {
    pub fn failing_with(errors: impl IntoIterator<Item = DeliveryError>) -> Self {
        Self {
            script: Mutex::new(errors.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Panics on the first `times` calls, then succeeds.
    pub fn panicking(times: u32) -> Self {
        Self {
            panics: AtomicU32::new(times),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn api_keys(&self) -> Vec<Option<String>> {
        self.api_keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl Deliverer for ScriptedDeliverer {
    async fn deliver(&self, request: DeliveryRequest<'_>) -> Result<PublishResult, DeliveryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self
            .panics
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            panic!("gateway client crashed");
        }
        self.api_keys
            .lock()
            .unwrap()
            .push(request.api_key.map(str::to_string));
        if let Some(err) = self.script.lock().unwrap().pop_front() {
            return Err(err);
        }
        let channel = request.content.channel;
        let id = format!("{channel}-{call}");
        Ok(PublishResult {
            channel,
            external_url: ExternalUrl::new(format!("https://example.com/{id}")).unwrap(),
            external_id: ExternalId::new(id).unwrap(),
            published_at: Timestamp::now(),
        })
    }
}

pub fn status(code: u16) -> DeliveryError {
    DeliveryError::Status {
        code,
        message: String::new(),
    }
}

pub fn network() -> DeliveryError {
    DeliveryError::Network {
        message: "connection reset".to_string(),
    }
}

/// Everything an engine test needs to inspect afterwards.
pub struct Harness {
    pub engine: PublishEngine,
    pub deliverer: Arc<ScriptedDeliverer>,
    pub sleeper: Arc<RecordingSleeper>,
    pub logger: Arc<RecordingLogger>,
}

pub fn harness(deliverer: ScriptedDeliverer, publishers: Vec<PublisherConfig>) -> Harness {
    let deliverer = Arc::new(deliverer);
    let sleeper = Arc::new(RecordingSleeper::default());
    let logger = Arc::new(RecordingLogger::default());
    let engine = PublishEngine::builder()
        .deliverer(deliverer.clone())
        .sleeper(sleeper.clone())
        .logger(logger.clone())
        .publishers(publishers)
        .build()
        .unwrap();
    Harness {
        engine,
        deliverer,
        sleeper,
        logger,
    }
}

/// A body of exactly `len` characters.
pub fn body_of(len: usize) -> String {
    "a".repeat(len)
}

pub fn content(channel: Channel, len: usize) -> ChannelContent {
    ChannelContent::new(channel, "title", body_of(len))
}

/// An x-thread body with `count` tweets of `len` characters each.
pub fn thread_body(count: usize, len: usize) -> String {
    vec![body_of(len); count].join(publish::THREAD_DELIMITER)
}
