//! Land-cover analysis API server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use landcover_api::config::ServiceConfig;
use landcover_api::routes::router;
use landcover_api::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "landcover-api")]
#[command(about = "Land-cover raster analysis server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:5000", env = "LANDCOVER_LISTEN_ADDR")]
    listen: String,

    /// Directory holding the per-year rasters
    #[arg(long, default_value = "data", env = "LANDCOVER_DATA_DIR")]
    data_dir: PathBuf,

    /// YAML catalog replacing the built-in categories, intents and years
    #[arg(long, env = "LANDCOVER_CATALOG")]
    catalog: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "LANDCOVER_WORKER_THREADS")]
    worker_threads: Option<usize>,
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

    let runtime = runtime_builder.build().context("Failed to create Tokio runtime")?;
    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting land-cover API server");

    let config = ServiceConfig::from_env(args.data_dir, args.catalog)?;
    if !config.data_dir.is_dir() {
        tracing::warn!(
            data_dir = %config.data_dir.display(),
            "Data directory does not exist; every year will be reported missing"
        );
    }
    let state = Arc::new(AppState::new(&config)?);

    let app = router(state, prometheus);

    let addr: SocketAddr = args.listen.parse().context("Invalid listen address")?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
