//! Marine Dashboard Server
//!
//! Live wind and wave forecast maps for the Argentine coast, plus browsers
//! for the pre-rendered daily snapshots.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use dashboard::config::{DashboardConfig, DEFAULT_CONFIG_PATH};
use dashboard::snapshot::write_snapshots;
use dashboard::state::AppState;

/// Marine Dashboard Server
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(about = "Marine wind and wave forecast dashboards")]
struct Args {
    /// YAML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH, env = "DASHBOARD_CONFIG")]
    config: PathBuf,

    /// Log level
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, global = true, env = "DASHBOARD_WORKER_THREADS")]
    worker_threads: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboards over HTTP (default)
    Serve {
        /// Listen address
        #[arg(short, long, default_value = "0.0.0.0:8501", env = "DASHBOARD_LISTEN_ADDR")]
        listen: String,
    },
    /// Fetch the current forecast once and write the daily combined maps
    Snapshot {
        /// Output directory (defaults to the configured snapshot directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }
    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let config = DashboardConfig::load(&args.config)?;
    let state = Arc::new(AppState::from_config(config).context("Failed to initialize state")?);

    match args.command.unwrap_or(Command::Serve {
        listen: "0.0.0.0:8501".to_string(),
    }) {
        Command::Serve { listen } => serve(state, &listen).await,
        Command::Snapshot { out_dir } => {
            let dir = out_dir.unwrap_or_else(|| state.config.snapshots.directory.clone());
            let written = write_snapshots(&state, Utc::now(), &dir).await?;
            info!(count = written.len(), dir = %dir.display(), "Snapshots written");
            Ok(())
        }
    }
}

async fn serve(state: Arc<AppState>, listen: &str) -> Result<()> {
    info!("Starting marine dashboard server");

    let app = dashboard::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", listen))?;
    info!("Dashboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
