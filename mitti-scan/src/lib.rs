//! mitti-scan library interface
//!
//! Soil-scan data fusion: concurrent geocode, weather and soil-grid fetches
//! plus on-device soil classification, merged with cache fallback into one
//! persisted [`SoilReport`](models::SoilReport).

pub mod advisory;
pub mod api;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod fusion;
pub mod models;
pub mod nutrients;
pub mod utils;

pub use crate::error::{ApiError, ApiResult, ScanError, ScanResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::cache::CacheStore;
use crate::db::AnalysisStore;
use crate::fusion::FusionEngine;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FusionEngine>,
    pub repository: Arc<dyn AnalysisStore>,
    pub cache: Arc<dyn CacheStore>,
    /// Cancelled on shutdown; aborts scans still gathering
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last failed scan for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        engine: Arc<FusionEngine>,
        repository: Arc<dyn AnalysisStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            engine,
            repository,
            cache,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::scan_routes())
        .merge(api::last_known_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
