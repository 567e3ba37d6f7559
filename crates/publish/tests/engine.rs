//! Channel adapter and engine routing, driven through a scripted deliverer.

mod common;

use std::sync::Arc;

use common::{content, harness, network, status, thread_body, ScriptedDeliverer};
use publish::{
    Channel, ChannelContent, ConfigError, ConstraintRegistry, ConstraintRule, PublishEngine,
    PublishEvent, PublisherConfig,
};

#[tokio::test]
async fn test_valid_content_is_published_once() {
    let h = harness(ScriptedDeliverer::default(), vec![]);
    let result = h.engine.publish(&content(Channel::Blog, 5000)).await.unwrap();
    assert_eq!(result.channel, Channel::Blog);
    assert!(result.external_id.as_str().starts_with("blog-"));
    assert_eq!(h.deliverer.calls(), 1);
    assert!(h.sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_invalid_content_never_reaches_deliverer() {
    let h = harness(ScriptedDeliverer::default(), vec![]);
    let err = h
        .engine
        .publish(&content(Channel::Blog, 1000))
        .await
        .unwrap_err();
    assert!(err.message.contains("too short"));
    assert!(err.message.contains("minimum 1500"));
    assert!(!err.retryable);
    assert_eq!(h.deliverer.calls(), 0);
    assert_eq!(
        h.logger.events(),
        vec![PublishEvent::Rejected {
            publisher: "blog".into(),
            message: "Content too short: 1000 chars (minimum 1500)".into(),
        }]
    );
}

#[tokio::test]
async fn test_transient_failures_are_retried_until_success() {
    let h = harness(
        ScriptedDeliverer::failing_with([status(503), network()]),
        vec![PublisherConfig::new(Channel::Linkedin).with_max_retries(2)],
    );
    let result = h.engine.publish(&content(Channel::Linkedin, 500)).await;
    assert!(result.is_ok());
    assert_eq!(h.deliverer.calls(), 3);
    assert_eq!(h.sleeper.sleeps_ms(), vec![1000, 2000]);
}

#[tokio::test]
async fn test_client_error_status_is_not_retried() {
    let h = harness(
        ScriptedDeliverer::failing_with([status(401)]),
        vec![PublisherConfig::new(Channel::Medium).with_max_retries(5)],
    );
    let err = h
        .engine
        .publish(&content(Channel::Medium, 3000))
        .await
        .unwrap_err();
    assert_eq!(err.status_code, Some(401));
    assert!(!err.retryable);
    assert_eq!(err.publisher, "medium");
    assert_eq!(h.deliverer.calls(), 1);
}

#[tokio::test]
async fn test_exhaustion_returns_last_delivery_error() {
    let h = harness(
        ScriptedDeliverer::failing_with([status(500), status(502), status(503)]),
        vec![PublisherConfig::new(Channel::Kakao).with_max_retries(2)],
    );
    let err = h
        .engine
        .publish(&content(Channel::Kakao, 500))
        .await
        .unwrap_err();
    assert_eq!(err.status_code, Some(503));
    assert!(err.retryable);
    assert_eq!(h.deliverer.calls(), 3);
}

#[tokio::test]
async fn test_api_key_is_forwarded_to_deliverer() {
    let h = harness(
        ScriptedDeliverer::default(),
        vec![PublisherConfig::new(Channel::Threads).with_api_key("tok")],
    );
    h.engine.publish(&content(Channel::Threads, 200)).await.unwrap();
    assert_eq!(h.deliverer.api_keys(), vec![Some("tok".to_string())]);
}

#[tokio::test]
async fn test_published_event_is_logged() {
    let h = harness(ScriptedDeliverer::default(), vec![]);
    let body = thread_body(5, 100);
    let content = ChannelContent::new(Channel::XThread, "t", body);
    let result = h.engine.publish(&content).await.unwrap();
    assert_eq!(
        h.logger.events().last(),
        Some(&PublishEvent::Published {
            publisher: "x-thread".into(),
            external_id: result.external_id.to_string(),
            external_url: result.external_url.to_string(),
        })
    );
}

// -------------------------------------------------------------------------
// Routing
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_unconfigured_channel_is_rejected() {
    let h = harness(
        ScriptedDeliverer::default(),
        vec![PublisherConfig::new(Channel::Blog)],
    );
    let err = h
        .engine
        .publish(&content(Channel::Medium, 3000))
        .await
        .unwrap_err();
    assert_eq!(err.message, "No publisher configured for channel: medium");
    assert!(!err.retryable);
}

#[tokio::test]
async fn test_unsupported_channel_is_rejected() {
    let h = harness(ScriptedDeliverer::default(), vec![]);
    let err = h
        .engine
        .publish(&content(Channel::Youtube, 100))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Channel not supported: youtube");
    assert_eq!(h.deliverer.calls(), 0);
}

#[tokio::test]
async fn test_adapter_rejects_mismatched_channel() {
    let h = harness(ScriptedDeliverer::default(), vec![]);
    let adapter = h.engine.adapter(Channel::Blog).unwrap();
    let err = adapter
        .publish(&content(Channel::Medium, 3000))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Channel mismatch: adapter for blog received medium");
    assert_eq!(h.deliverer.calls(), 0);
}

#[tokio::test]
async fn test_panicking_deliverer_is_retried_as_transient() {
    let h = harness(
        ScriptedDeliverer::panicking(1),
        vec![PublisherConfig::new(Channel::Linkedin).with_max_retries(1)],
    );
    let result = h.engine.publish(&content(Channel::Linkedin, 500)).await;
    assert!(result.is_ok());
    assert_eq!(h.deliverer.calls(), 2);
    assert_eq!(h.sleeper.sleeps_ms(), vec![1000]);
}

#[tokio::test]
async fn test_panicking_deliverer_surfaces_as_error_value() {
    let h = harness(
        ScriptedDeliverer::panicking(5),
        vec![PublisherConfig::new(Channel::Linkedin).with_max_retries(0)],
    );
    let err = h
        .engine
        .publish(&content(Channel::Linkedin, 500))
        .await
        .unwrap_err();
    assert!(err.retryable);
    assert_eq!(err.status_code, None);
    assert_eq!(err.publisher, "linkedin");
    assert_eq!(err.message, "deliverer panicked: gateway client crashed");
}

#[tokio::test]
async fn test_publish_all_keeps_input_order() {
    let h = harness(ScriptedDeliverer::default(), vec![]);
    let batch = vec![
        content(Channel::Blog, 5000),
        content(Channel::Blog, 10),
        content(Channel::Newsletter, 1000),
    ];
    let results = h.engine.publish_all(&batch).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().channel, Channel::Blog);
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().channel, Channel::Newsletter);
    assert_eq!(h.deliverer.calls(), 2);
}

// -------------------------------------------------------------------------
// Builder
// -------------------------------------------------------------------------

#[test]
fn test_default_publishers_cover_registry() {
    let h = harness(ScriptedDeliverer::default(), vec![]);
    assert_eq!(h.engine.channels(), ConstraintRegistry::standard().channels());
    let blog = h.engine.adapter(Channel::Blog).unwrap();
    assert_eq!(blog.config().max_retries, publish::DEFAULT_MAX_RETRIES);
}

#[test]
fn test_build_requires_deliverer() {
    let err = PublishEngine::builder().build().unwrap_err();
    assert_eq!(err.to_string(), "Configuration error: no deliverer configured");
}

#[test]
fn test_build_rejects_duplicate_publisher() {
    let err = PublishEngine::builder()
        .deliverer(Arc::new(ScriptedDeliverer::default()))
        .publisher(PublisherConfig::new(Channel::Blog))
        .publisher(PublisherConfig::new(Channel::Blog).with_max_retries(1))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::DuplicatePublisher {
            channel: Channel::Blog
        }
    );
}

#[test]
fn test_build_rejects_publisher_without_rule() {
    let err = PublishEngine::builder()
        .deliverer(Arc::new(ScriptedDeliverer::default()))
        .publisher(PublisherConfig::new(Channel::Tiktok))
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "Channel not supported: tiktok");
}

#[tokio::test]
async fn test_registry_extension_enables_new_channel() {
    let deliverer = Arc::new(ScriptedDeliverer::default());
    let engine = PublishEngine::builder()
        .registry(
            ConstraintRegistry::standard()
                .with_rule(Channel::Webtoon, ConstraintRule::length(1, 100)),
        )
        .deliverer(deliverer.clone())
        .publisher(PublisherConfig::new(Channel::Webtoon))
        .build()
        .unwrap();
    let result = engine.publish(&content(Channel::Webtoon, 50)).await.unwrap();
    assert_eq!(result.channel, Channel::Webtoon);
    assert_eq!(deliverer.calls(), 1);
}
