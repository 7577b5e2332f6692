//! Scamguard
//!
//! Command-line entry point for the scam moderation pipeline. Runs single
//! messages through the full pipeline against a dry-run platform, reports on
//! the example store, and validates configuration before deployment.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use scamguard_bot::{DryRunPlatform, ModerationPipeline};
use scamguard_classifiers::{backend_by_name, ClassifierBackend, ProviderCredentials};
use scamguard_core::{Author, Message};
use scamguard_memory::ExampleStore;
use scamguard_policy::{AdmissionFilter, DecisionEngine, ModerationConfig};
use scamguard_telemetry::ActionLog;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "scamguard")]
#[command(about = "Scam moderation pipeline", version, long_about = None)]
struct Cli {
    /// Configuration file path (defaults to SAFETY_CONFIG_PATH, config.yaml, config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Serve Prometheus metrics on this address
    #[arg(long, global = true)]
    metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one message through the pipeline with a dry-run platform
    Check {
        /// Message content
        #[arg(short, long)]
        text: String,

        /// Channel the message is posted in
        #[arg(long, default_value = "dry-run")]
        channel: String,

        /// Account age of the author
        #[arg(long, default_value_t = 30)]
        author_age_days: i64,
    },

    /// Print example store statistics
    Stats,

    /// Load the configuration, compile patterns, and resolve the provider
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine
    let dotenv = dotenvy::dotenv().ok();

    let config = ModerationConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(cli.verbose, &config.logging.level);
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "Loaded environment file");
    }

    if let Some(addr) = cli.metrics_addr {
        init_metrics(addr)?;
    }

    match cli.command {
        Command::Check {
            text,
            channel,
            author_age_days,
        } => check(&config, text, channel, author_age_days).await,
        Command::Stats => stats(&config),
        Command::Validate => validate(&config),
    }
}

async fn check(
    config: &ModerationConfig,
    text: String,
    channel: String,
    author_age_days: i64,
) -> Result<()> {
    let backend = build_backend(config)?;
    let platform = Arc::new(DryRunPlatform::new());
    let action_log = Arc::new(
        ActionLog::open(&config.action_log_path).context("Failed to open action log")?,
    );
    let pipeline = ModerationPipeline::new(config, platform.clone(), backend, action_log.clone())?;

    let now = Utc::now();
    let message = Message {
        id: format!("dry-run-{}", now.timestamp_millis()),
        channel_id: channel,
        guild_id: Some("dry-run".to_string()),
        author: Author {
            id: "dry-run-user".to_string(),
            name: "dry-run".to_string(),
            bot: false,
            created_at: now - chrono::Duration::days(author_age_days.max(0)),
        },
        content: text,
    };

    let outcome = pipeline.process(message).await;
    action_log.flush().await;

    let report = serde_json::json!({
        "outcome": outcome.as_str(),
        "result": outcome.moderated(),
        "platformCalls": platform.calls(),
        "metrics": pipeline.metrics().snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn stats(config: &ModerationConfig) -> Result<()> {
    let store = ExampleStore::open(&config.examples_dir);
    let stats = store.stats().context("Failed to read example store")?;

    info!(
        seed = stats.seed,
        learned = stats.learned,
        dir = %config.examples_dir.display(),
        "Example store"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn validate(config: &ModerationConfig) -> Result<()> {
    AdmissionFilter::from_config(config)?;
    DecisionEngine::new(config.moderation.delete_if_hard_block_regex)?;
    let backend = build_backend(config)?;

    info!(
        provider = %backend.name(),
        model = %config.model,
        production_ready = config.production_ready,
        mod_channel = config.channels.mod_channel_id.is_some(),
        debug_channel = config.channels.debug_channel_id.is_some(),
        "Configuration valid"
    );
    println!("Configuration OK");
    Ok(())
}

/// Resolve the configured classifier backend; a missing credential is fatal
fn build_backend(config: &ModerationConfig) -> Result<Arc<dyn ClassifierBackend>> {
    let client = reqwest::Client::builder()
        .timeout(config.classifier_timeout())
        .build()?;
    let backend = backend_by_name(&config.provider, &ProviderCredentials::from_env(), client)
        .with_context(|| format!("Failed to initialise provider '{}'", config.provider))?;
    Ok(backend)
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("scamguard=debug")
        } else {
            EnvFilter::try_new(format!("scamguard={}", level))
                .unwrap_or_else(|_| EnvFilter::new("scamguard=info"))
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the Prometheus recorder with its own HTTP listener
fn init_metrics(addr: SocketAddr) -> Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    scamguard_telemetry::metrics::describe();

    info!(addr = %addr, "Metrics exporter listening");
    Ok(())
}
