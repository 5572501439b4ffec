//! mitti-scan - soil-scan fusion service
//!
//! Hosts the scan pipeline behind a local HTTP API for the UI process.
//! Default port: 5730

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mitti_common::config::{resolve_in_root, resolve_root_folder, ROOT_FOLDER_ENV};
use mitti_scan::cache::CacheStore;
use mitti_scan::classifier::LocalModelClassifier;
use mitti_scan::config::{ScanConfig, CONFIG_FILE_NAME};
use mitti_scan::db::{AnalysisStore, SqliteAnalysisRepository, SqliteCacheStore};
use mitti_scan::fusion::adapters::{NominatimGeocoder, OpenMeteoAdapter, SoilGridsAdapter};
use mitti_scan::fusion::{FusionEngine, ScanSources};
use mitti_scan::AppState;

#[derive(Debug, Parser)]
#[command(name = "mitti-scan", version, about = "Soil-scan data fusion service")]
struct Args {
    /// Root folder holding the database, model and config (or MITTI_ROOT_FOLDER)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Config file (default: <root folder>/mitti-scan.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port, overrides the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mitti_scan=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting mitti-scan (soil-scan fusion) service");
    info!(
        "Version: {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    // Root folder: CLI → env → TOML → OS default
    let root_folder = resolve_root_folder(
        args.root_folder.as_deref(),
        ROOT_FOLDER_ENV,
        args.config.as_deref(),
    );
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| root_folder.join(CONFIG_FILE_NAME));
    let mut config = ScanConfig::load(&config_path)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let db_path = resolve_in_root(&root_folder, &config.database_file);
    info!("Database: {}", db_path.display());
    let pool = mitti_common::db::init_database(&db_path).await?;

    let model_path = resolve_in_root(&root_folder, &config.model_path);
    if !model_path.exists() {
        tracing::warn!(
            "Model file {} not found; image scans will report Analysis Error",
            model_path.display()
        );
    }

    let sources = ScanSources {
        geocoder: Arc::new(NominatimGeocoder::new(
            &config.geocoder.base_url,
            config.geocoder.timeout(),
        )?),
        weather: Arc::new(OpenMeteoAdapter::new(
            &config.weather.base_url,
            config.weather.timeout(),
        )?),
        soil_grid: Arc::new(SoilGridsAdapter::new(
            &config.soil_grid.base_url,
            config.soil_grid.timeout(),
        )?),
        classifier: Arc::new(LocalModelClassifier::new(model_path)),
    };

    let cache: Arc<dyn CacheStore> =
        Arc::new(SqliteCacheStore::new(pool.clone(), config.max_lock_wait_ms));
    let repository: Arc<dyn AnalysisStore> =
        Arc::new(SqliteAnalysisRepository::new(pool.clone(), config.max_lock_wait_ms));

    let engine = FusionEngine::new(sources, cache.clone(), repository.clone())
        .with_default_weather_coordinates(config.default_weather_coordinates()?);

    let state = AppState::new(Arc::new(engine), repository, cache);
    let shutdown = state.shutdown.clone();
    let app = mitti_scan::build_router(state);

    let bind_addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested, cancelling in-flight scans");
            shutdown.cancel();
        })
        .await?;

    // Let queued writes finish before the pool closes
    tokio::time::timeout(Duration::from_secs(5), pool.close())
        .await
        .ok();
    info!("mitti-scan stopped");

    Ok(())
}
