use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use memwatch::data::duration::parse_duration_arg;
use memwatch::{Monitor, Outcome, Overrides, PrometheusClient, Settings, StatusPrinter, Theme};

#[derive(Parser, Debug)]
#[command(name = "memwatch", version)]
#[command(about = "Watch a Prometheus memory gauge and fail once it stays above a threshold")]
struct Args {
    /// Prometheus URL [default: http://localhost:9090]
    #[arg(long)]
    url: Option<String>,

    /// Threshold percent [default: 75]
    #[arg(long)]
    threshold: Option<f64>,

    /// Time over threshold before failing (e.g., "10s", "1m30s") [default: 10s]
    #[arg(long, value_parser = parse_duration_arg)]
    duration: Option<Duration>,

    /// Polling interval [default: 1s]
    #[arg(long, value_parser = parse_duration_arg)]
    interval: Option<Duration>,

    /// HTTP timeout for each query [default: 5s]
    #[arg(long, value_parser = parse_duration_arg)]
    timeout: Option<Duration>,

    /// Configuration file (TOML, YAML or JSON); MEMWATCH_* variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    rt.block_on(run(args))
}

/// Log to stderr so stdout carries only status lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    let overrides = Overrides {
        url: args.url,
        threshold: args.threshold,
        duration: args.duration,
        interval: args.interval,
        timeout: args.timeout,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    let client = PrometheusClient::builder()
        .endpoint(settings.url.as_str())
        .timeout(settings.timeout)
        .build()
        .context("Failed to create Prometheus client")?;

    let theme = if args.no_color {
        Theme::plain()
    } else {
        Theme::auto_detect()
    };

    let mut monitor = Monitor::new(
        Box::new(client),
        settings.policy(),
        settings.interval,
        StatusPrinter::new(io::stdout(), theme),
    );

    let outcome = tokio::select! {
        result = monitor.run() => Outcome::Escalated(result?),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for interrupt")?;
            Outcome::Interrupted
        }
    };

    match &outcome {
        Outcome::Escalated(escalation) => error!(
            value = escalation.value,
            elapsed = ?escalation.elapsed,
            required = ?escalation.required,
            "memory stayed above threshold, exiting with status {}",
            outcome.exit_status()
        ),
        Outcome::Interrupted => info!("interrupted, exiting"),
    }

    Ok(ExitCode::from(outcome.exit_status()))
}
