//! jvbd: the JVB exporter daemon.
//!
//! Single binary that assembles the exporter:
//! - Metric catalog (built-in or from file)
//! - Stats cache + collector
//! - Per-bridge pollers
//! - Cache eviction
//! - HTTP API with the Prometheus endpoint
//!
//! # Usage
//!
//! ```text
//! jvbd run --config /etc/jvb-exporter.toml --listen 0.0.0.0:9210
//! jvbd catalog --config /etc/jvb-exporter.toml
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use jvb_core::ExporterConfig;
use jvb_core::duration_format::parse_duration;
use jvb_metrics::StatsCollector;
use jvb_poller::StatsPoller;

#[derive(Parser)]
#[command(name = "jvbd", about = "JVB stats exporter daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the configured bridges and serve Prometheus metrics.
    Run {
        /// Exporter config file. Built-in defaults are used when absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to listen on (overrides `[server] listen`).
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Retention window, e.g. `30s` (overrides `[exporter] retention`).
        #[arg(long, value_parser = parse_duration)]
        retention: Option<Duration>,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },
    /// Print the effective metric catalog as TOML.
    Catalog {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            listen,
            retention,
            log_json,
        } => {
            init_tracing(log_json);
            let mut config = load_config(config.as_deref())?;
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            if let Some(retention) = retention {
                config.exporter.retention = retention;
            }
            config.validate()?;
            run(config).await
        }
        Command::Catalog { config } => {
            let config = load_config(config.as_deref())?;
            let catalog = config.load_catalog()?;
            print!("{}", catalog.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,jvbd=debug,jvb=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ExporterConfig> {
    match path {
        Some(path) => ExporterConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ExporterConfig::default()),
    }
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!("JVB exporter starting");

    // ── Initialize subsystems ──────────────────────────────────

    let catalog = config.load_catalog().context("loading metric catalog")?;
    info!(metrics = catalog.len(), prefix = catalog.prefix(), "catalog loaded");

    let collector = StatsCollector::new(catalog, config.exporter.retention);
    info!(
        retention_secs = config.exporter.retention.as_secs(),
        "stats collector initialized"
    );

    let poller = StatsPoller::new(collector.clone());
    for target in &config.targets {
        poller.start_target(target).await;
    }
    if config.targets.is_empty() {
        warn!("no targets configured, expecting pushed stats only");
    }

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let eviction_handle = config.exporter.eviction_after.map(|max_age| {
        let collector = collector.clone();
        let interval = config.exporter.eviction_interval;
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            collector.run_eviction(interval, max_age, shutdown).await;
        })
    });

    // ── Start API server ───────────────────────────────────────

    let router = jvb_api::build_router(collector);
    let addr = config.server.listen;

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for background tasks.
    poller.stop_all().await;
    if let Some(handle) = eviction_handle {
        let _ = handle.await;
    }

    info!("JVB exporter stopped");
    Ok(())
}
