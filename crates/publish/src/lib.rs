//! Core publish domain for Omnipost.
//!
//! This crate takes a finished [`ChannelContent`], validates it against its
//! channel's structural constraints, and drives delivery through a
//! retry/backoff policy that separates terminal failures from transient ones.
//! Every failure is returned as a [`PublishError`] value.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network or
//! file-system I/O. It defines *what* a delivery is ([`Deliverer`]); the
//! `transport` crate defines *how* to perform one.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`channel`] | The closed [`Channel`] set |
//! | [`types`] | Boundary values (`ChannelContent`, `PublishResult`, `PublisherConfig`, `Timestamp`) |
//! | [`identifiers`] | Newtype identifiers (`ExternalId`, `ExternalUrl`, `PublishRunId`) |
//! | [`errors`] | `PublishError`, `DeliveryError`, `ConfigError`, `RetryPolicy` |
//! | [`constraints`] | Constraint registry and rule types |
//! | [`validation`] | The validator and thread segmentation |
//! | [`classify`] | Status-code retry classification |
//! | [`retry`] | The retry executor and its timer port |
//! | [`delivery`] | The [`Deliverer`] port |
//! | [`logging`] | The injected [`PublishLogger`] capability |
//! | [`engine`] | Channel adapters and the routing engine |

pub mod channel;
pub mod classify;
pub mod constraints;
pub mod delivery;
pub mod engine;
pub mod errors;
pub mod identifiers;
pub mod logging;
pub mod retry;
pub mod types;
pub mod validation;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use channel::Channel;
pub use classify::{classify_status, is_retryable_status};
pub use constraints::{
    ConstraintRegistry, ConstraintRule, StructuralRule, SLIDE_COUNT_KEY, THREAD_DELIMITER,
};
pub use delivery::{Deliverer, DeliveryRequest};
pub use engine::{ChannelAdapter, PublishEngine, PublishEngineBuilder};
pub use errors::{ConfigError, DeliveryError, PublishError, RetryPolicy};
pub use identifiers::{ExternalId, ExternalUrl, PublishRunId};
pub use logging::{NoopLogger, PublishEvent, PublishLogger, TracingLogger};
pub use retry::{
    backoff_delay, rate_limit_delay, with_retry, RetryExecutor, Sleeper, TokioSleeper,
    DEFAULT_BASE_DELAY,
};
pub use types::{
    ChannelContent, Metadata, PublishResult, PublisherConfig, Timestamp, DEFAULT_MAX_RETRIES,
};
pub use validation::{split_thread, validate};
