//! `.omnipost/config.toml` loading and validation.
//!
//! Every section is optional; an absent file yields the defaults (simulated
//! transport, 1 s base delay, one publisher per supported channel). Problems
//! are reported at load time so the engine never starts misconfigured.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use publish::{Channel, ConfigError, PublisherConfig, DEFAULT_MAX_RETRIES};
use serde::Deserialize;

/// Path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = ".omnipost/config.toml";

/// Root of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// `[retry]`
    #[serde(default)]
    pub retry: RetrySection,
    /// `[transport]`
    #[serde(default)]
    pub transport: TransportSection,
    /// `[observability]`
    #[serde(default)]
    pub observability: ObservabilitySection,
    /// `[[publishers]]`; empty means one default publisher per channel.
    #[serde(default)]
    pub publishers: Vec<PublisherEntry>,
}

/// `[retry]`: backoff settings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Base of the exponential backoff in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_base_delay_ms() -> u64 {
    publish::DEFAULT_BASE_DELAY.as_millis() as u64
}

/// Which [`publish::Deliverer`] to construct.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportSection {
    /// Fixed-latency stand-in that never touches the network.
    Simulated {
        /// Round-trip time in milliseconds.
        #[serde(default = "default_latency_ms")]
        latency_ms: u64,
    },
    /// JSON-over-HTTP publishing gateway.
    Http {
        /// Gateway base URL (`http://` or `https://`).
        endpoint: String,
        /// Per-request timeout in milliseconds.
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
}

impl Default for TransportSection {
    fn default() -> Self {
        TransportSection::Simulated {
            latency_ms: default_latency_ms(),
        }
    }
}

fn default_latency_ms() -> u64 {
    transport::DEFAULT_LATENCY.as_millis() as u64
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// `[observability]`: log format and span export.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilitySection {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit newline-delimited JSON log lines.
    #[serde(default)]
    pub json: bool,
    /// OTLP gRPC collector; spans are exported only when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilitySection {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            otlp_endpoint: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// One `[[publishers]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherEntry {
    /// Channel name, e.g. `x-thread`.
    pub channel: String,
    /// Inline credential.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key; used when `api_key` is unset.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl CliConfig {
    /// Reads and validates the file at `path`.
    ///
    /// A missing file is only tolerated when `allow_missing` is set (the
    /// default path was not overridden).
    pub fn load(path: &Path, allow_missing: bool) -> anyhow::Result<Self> {
        if allow_missing && !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parses and validates TOML text.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let config: CliConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let TransportSection::Http { endpoint, .. } = &self.transport {
            if endpoint.trim().is_empty() {
                bail!("transport.endpoint must not be empty");
            }
        }
        self.publisher_configs()?;
        Ok(())
    }

    /// Base delay of the retry schedule.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.retry.base_delay_ms)
    }

    /// Resolves `[[publishers]]` into domain configs.
    pub fn publisher_configs(&self) -> Result<Vec<PublisherConfig>, ConfigError> {
        self.publishers
            .iter()
            .map(|entry| {
                let channel: Channel = entry.channel.parse()?;
                let api_key = entry.api_key.clone().or_else(|| {
                    entry
                        .api_key_env
                        .as_deref()
                        .and_then(|var| std::env::var(var).ok())
                });
                let mut config = PublisherConfig::new(channel).with_max_retries(entry.max_retries);
                config.api_key = api_key;
                Ok(config)
            })
            .collect()
    }
}
