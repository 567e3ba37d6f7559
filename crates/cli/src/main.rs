//! Omnipost CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load `.omnipost/config.toml` and validate it.
//! 2. **Wire observability**: configure `tracing-subscriber` with a text or
//!    JSON layer and an optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: create the configured
//!    [`publish::Deliverer`] (simulated or HTTP) and inject it, together with
//!    the tracing-backed logger, into a [`publish::PublishEngine`].
//! 4. **Run the command**: `publish`, `validate`, or `channels`, printing
//!    JSON on stdout.

mod config;
mod telemetry;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use publish::{
    Channel, ChannelContent, ConstraintRegistry, Deliverer, PublishEngine, PublishError,
    PublishResult, TracingLogger,
};
use serde::{Deserialize, Serialize};
use transport::{HttpDeliverer, SimulatedDeliverer};

use crate::config::{CliConfig, TransportSection, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "omnipost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate and publish finished content to external channels", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "OMNIPOST_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and publish content (a JSON object or array of objects)
    Publish {
        /// Path to the content JSON file
        #[arg(short = 'f', long)]
        content: PathBuf,
    },

    /// Check content against channel constraints without publishing
    Validate {
        /// Path to the content JSON file
        #[arg(short = 'f', long)]
        content: PathBuf,
    },

    /// List every channel and its constraints
    Channels,
}

/// A content file holds one item or a batch.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentInput {
    One(ChannelContent),
    Many(Vec<ChannelContent>),
}

impl ContentInput {
    fn into_vec(self) -> Vec<ChannelContent> {
        match self {
            ContentInput::One(content) => vec![content],
            ContentInput::Many(contents) => contents,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum PublishOutcome {
    Published { result: PublishResult },
    Failed { error: PublishError },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationOutcome {
    channel: Channel,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<PublishError>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSummary {
    channel: Channel,
    supported: bool,
    configured: bool,
    constraints: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (path, allow_missing) = match &cli.config {
        Some(path) => (path.clone(), false),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), true),
    };
    let config = CliConfig::load(&path, allow_missing)?;
    let telemetry = telemetry::init(&config.observability, cli.json)?;
    tracing::debug!(config = %path.display(), "configuration loaded");

    let outcome = dispatch(&config, cli.command).await;
    if let Err(err) = &outcome {
        tracing::error!(error = %format!("{err:#}"), "command failed");
    }
    // Flushed on every path so spans from a failing run are still exported.
    telemetry.shutdown();

    Ok(if outcome? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Runs one command; `false` means at least one item failed.
async fn dispatch(config: &CliConfig, command: Command) -> anyhow::Result<bool> {
    let engine = build_engine(config)?;
    match command {
        Command::Publish { content } => publish(&engine, &content).await,
        Command::Validate { content } => validate(&engine, &content),
        Command::Channels => channels(&engine),
    }
}

fn build_engine(config: &CliConfig) -> anyhow::Result<PublishEngine> {
    let deliverer: Arc<dyn Deliverer> = match &config.transport {
        TransportSection::Simulated { latency_ms } => {
            Arc::new(SimulatedDeliverer::new(Duration::from_millis(*latency_ms)))
        }
        TransportSection::Http {
            endpoint,
            timeout_ms,
        } => Arc::new(HttpDeliverer::new(
            endpoint.clone(),
            Duration::from_millis(*timeout_ms),
        )?),
    };

    let engine = PublishEngine::builder()
        .registry(ConstraintRegistry::standard())
        .deliverer(deliverer)
        .logger(Arc::new(TracingLogger))
        .base_delay(config.base_delay())
        .publishers(config.publisher_configs()?)
        .build()
        .context("failed to assemble publish engine")?;
    Ok(engine)
}

fn read_contents(path: &Path) -> anyhow::Result<Vec<ChannelContent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read content file {}", path.display()))?;
    let input: ContentInput = serde_json::from_str(&raw)
        .with_context(|| format!("invalid content JSON in {}", path.display()))?;
    Ok(input.into_vec())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Returns `false` when any item failed.
async fn publish(engine: &PublishEngine, path: &Path) -> anyhow::Result<bool> {
    let contents = read_contents(path)?;
    let outcomes: Vec<PublishOutcome> = engine
        .publish_all(&contents)
        .await
        .into_iter()
        .map(|result| match result {
            Ok(result) => PublishOutcome::Published { result },
            Err(error) => PublishOutcome::Failed { error },
        })
        .collect();
    let all_ok = outcomes
        .iter()
        .all(|o| matches!(o, PublishOutcome::Published { .. }));
    print_json(&outcomes)?;
    Ok(all_ok)
}

fn validate(engine: &PublishEngine, path: &Path) -> anyhow::Result<bool> {
    let outcomes: Vec<ValidationOutcome> = read_contents(path)?
        .iter()
        .map(|content| {
            let error = engine.validate(content).err();
            ValidationOutcome {
                channel: content.channel,
                valid: error.is_none(),
                error,
            }
        })
        .collect();
    let all_ok = outcomes.iter().all(|o| o.valid);
    print_json(&outcomes)?;
    Ok(all_ok)
}

fn channels(engine: &PublishEngine) -> anyhow::Result<bool> {
    let registry = engine.registry();
    let summaries: Vec<ChannelSummary> = Channel::ALL
        .into_iter()
        .map(|channel| {
            let rule = registry.rule(channel);
            ChannelSummary {
                channel,
                supported: rule.is_some(),
                configured: engine.adapter(channel).is_some(),
                constraints: rule.map(|r| r.summary()),
            }
        })
        .collect();
    print_json(&summaries)?;
    Ok(true)
}
