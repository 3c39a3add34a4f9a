//! lifecycle-provider: custom resource provider for long-running AWS operations
//!
//! Each invocation reads one lifecycle event as JSON (stdin or `--input`),
//! runs either the on-event handler or the completion poller, and writes the
//! JSON result to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use garde::Validate;
use lifecycle_common::defaults::DEFAULT_REGION;
use lifecycle_common::{LifecycleEvent, OperationKind};
use lifecycle_provider::aws::{AwsContext, Backend};
use lifecycle_provider::config::{AwsConfig, RunConfig};
use lifecycle_provider::{ProviderConfig, ProviderError, ProviderManifest, ResourceLifecycleProvider};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "lifecycle-provider")]
#[command(about = "Asynchronous custom resource provider for CodeBuild builds and Bedrock agents")]
#[command(version)]
struct Args {
    /// Backend the provider drives
    #[arg(long, global = true, env = "LIFECYCLE_OPERATION_KIND", default_value = "build")]
    kind: OperationKind,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    /// Per-invocation timeout in seconds (default: 900)
    #[arg(long, global = true, env = "LIFECYCLE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Handler memory in MiB (default: 1024)
    #[arg(long, global = true, env = "LIFECYCLE_MEMORY_MB")]
    memory_mb: Option<u32>,

    /// Interval between completion polls in seconds (default: 5)
    #[arg(long, global = true, env = "LIFECYCLE_QUERY_INTERVAL_SECS")]
    query_interval_secs: Option<u64>,

    /// Total polling budget in seconds (default: 1800)
    #[arg(long, global = true, env = "LIFECYCLE_TOTAL_TIMEOUT_SECS")]
    total_timeout_secs: Option<u64>,

    /// Handler log retention in days (default: 7)
    #[arg(long, global = true, env = "LIFECYCLE_LOG_RETENTION_DAYS")]
    log_retention_days: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Read the event from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Handle a lifecycle event: start the operation for Create/Update
    OnEvent(InputArgs),

    /// Poll the operation started by on-event
    IsComplete(InputArgs),

    /// Print the provider manifest (limits and privilege set) as JSON
    Manifest,
}

impl From<&Args> for RunConfig {
    fn from(args: &Args) -> Self {
        Self {
            kind: args.kind,
            aws: AwsConfig {
                region: args.region.clone(),
                aws_profile: args.aws_profile.clone(),
            },
            provider: ProviderConfig {
                timeout: args.timeout_secs.map(Duration::from_secs),
                memory_mb: args.memory_mb,
                query_interval: args.query_interval_secs.map(Duration::from_secs),
                total_timeout: args.total_timeout_secs.map(Duration::from_secs),
                log_retention_days: args.log_retention_days,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if let Some(suggestion) = e
        .downcast_ref::<ProviderError>()
        .and_then(ProviderError::suggestion)
    {
        let _ = writeln!(stderr, "  \x1b[36mHint:\x1b[0m {suggestion}");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // stdout carries the JSON result only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = RunConfig::from(&args);
    config
        .provider
        .validate()
        .map_err(|report| anyhow::anyhow!("Invalid provider configuration: {}", report))?;

    match args.command {
        Command::Manifest => {
            write_json(&ProviderManifest::new(config.kind, &config.provider))?;
        }
        Command::OnEvent(input) => {
            let event = read_event(input.input.as_deref()).await?;
            let provider = build_provider(&config).await;
            let result = invoke(&config, "on-event", provider.on_event(&event)).await?;
            write_json(&result)?;
        }
        Command::IsComplete(input) => {
            let event = read_event(input.input.as_deref()).await?;
            let provider = build_provider(&config).await;
            let result = invoke(&config, "is-complete", provider.is_complete(&event)).await?;
            write_json(&result)?;
        }
    }

    Ok(())
}

async fn build_provider(config: &RunConfig) -> ResourceLifecycleProvider<Backend> {
    if let Some(profile) = config.aws_profile() {
        info!(profile = %profile, "Using AWS profile");
    }

    let aws = AwsContext::with_profile(config.region(), config.aws_profile()).await;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    let backend = Backend::for_kind(config.kind, &aws, cancel);
    ResourceLifecycleProvider::new(backend, config.provider.clone())
}

/// Run one handler call under the configured invocation timeout
async fn invoke<T, F>(config: &RunConfig, name: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let timeout = config.provider.timeout();
    info!(
        handler = name,
        kind = %config.kind,
        region = %config.region(),
        timeout_secs = timeout.as_secs(),
        "Invoking handler"
    );

    let result = tokio::time::timeout(timeout, call)
        .await
        .with_context(|| format!("{} timed out after {}s", name, timeout.as_secs()))??;
    Ok(result)
}

async fn read_event(path: Option<&std::path::Path>) -> Result<LifecycleEvent> {
    let raw = match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event from {}", path.display()))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read event from stdin")?;
            raw
        }
    };

    let event: LifecycleEvent = serde_json::from_str(&raw).context("Failed to parse lifecycle event")?;
    debug!(
        request_type = %event.request_type,
        request_id = ?event.request_id,
        logical_id = ?event.logical_resource_id,
        "Event received"
    );
    Ok(event)
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
