//! Omnipost delivery infrastructure.
//!
//! Implements the [`publish::Deliverer`] trait with two backends:
//!
//! - [`SimulatedDeliverer`]: waits a fixed latency and synthesises
//!   `"{channel}-{millis}"` identifiers and per-channel URLs. This is the
//!   default transport and the one used for dry runs.
//! - [`HttpDeliverer`]: forwards content to a publishing gateway over HTTP
//!   and reports non-success responses as status errors, so the retry policy
//!   in [`publish`] can classify them.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request formatting, response parsing, and transport
//! errors live here. The [`publish`] crate sees only [`publish::Deliverer`]
//! and [`publish::DeliveryError`].

pub mod http;
pub mod simulated;

pub use http::{HttpDeliverer, TransportError};
pub use simulated::{external_url, SimulatedDeliverer, DEFAULT_LATENCY};
