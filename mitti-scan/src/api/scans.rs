//! Scan API handlers
//!
//! POST /scans, GET /scans, GET /scans/latest, GET /scans/:id,
//! DELETE /scans/:id, DELETE /scans

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult, ScanError};
use crate::fusion::ScanRequest;
use crate::models::{Coordinates, SoilReport};
use crate::nutrients::NutrientStatuses;
use crate::AppState;

/// Base64 photos from phone cameras exceed axum's 2 MB default
pub const MAX_SCAN_BODY_BYTES: usize = 16 * 1024 * 1024;

/// POST /scans request
#[derive(Debug, Default, Deserialize)]
pub struct CreateScanRequest {
    /// Photo bytes, standard base64
    pub image_base64: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

impl CreateScanRequest {
    fn into_scan_request(self) -> ApiResult<ScanRequest> {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
            (None, None) => None,
            _ => {
                return Err(ApiError::BadRequest(
                    "latitude and longitude must be supplied together".to_string(),
                ))
            }
        };

        let image = self
            .image_base64
            .filter(|encoded| !encoded.trim().is_empty())
            .map(|encoded| {
                STANDARD
                    .decode(encoded.trim())
                    .map(Bytes::from)
                    .map_err(|e| ApiError::BadRequest(format!("image_base64: {}", e)))
            })
            .transpose()?;

        Ok(ScanRequest::new(image, coordinates, self.notes))
    }
}

/// Report plus the derived values the UI renders next to it
#[derive(Debug, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: SoilReport,
    pub nutrient_status: NutrientStatuses,
    pub irrigation_advice: &'static str,
    pub fully_live: bool,
}

impl From<SoilReport> for ReportView {
    fn from(report: SoilReport) -> Self {
        Self {
            nutrient_status: report.nutrient_statuses(),
            irrigation_advice: report.environmental.irrigation_advice(),
            fully_live: report.is_fully_live(),
            report,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// POST /scans
pub async fn create_scan(
    State(state): State<AppState>,
    Json(request): Json<CreateScanRequest>,
) -> ApiResult<Json<ReportView>> {
    let request = request.into_scan_request()?;

    match state.engine.run_scan_with_cancel(request, &state.shutdown).await {
        Ok(report) => Ok(Json(report.into())),
        Err(e) => {
            if !matches!(e, ScanError::InvalidInput(_)) {
                *state.last_error.write().await = Some(e.to_string());
            }
            Err(e.into())
        }
    }
}

/// GET /scans (most recent first)
pub async fn list_scans(State(state): State<AppState>) -> ApiResult<Json<Vec<ReportView>>> {
    let reports = state.repository.get_all().await?;
    tracing::debug!(count = reports.len(), "Listing soil reports");
    Ok(Json(reports.into_iter().map(ReportView::from).collect()))
}

/// GET /scans/latest
pub async fn latest_scan(State(state): State<AppState>) -> ApiResult<Json<ReportView>> {
    state
        .repository
        .get_latest()
        .await?
        .map(|report| Json(report.into()))
        .ok_or_else(|| ApiError::NotFound("no soil reports recorded".to_string()))
}

/// GET /scans/:id
pub async fn get_scan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ReportView>> {
    state
        .repository
        .get_by_id(id)
        .await?
        .map(|report| Json(report.into()))
        .ok_or_else(|| ApiError::NotFound(format!("soil report {}", id)))
}

/// DELETE /scans/:id
pub async fn delete_scan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    if state.repository.delete(id).await? {
        Ok(Json(DeleteResponse { deleted: 1 }))
    } else {
        Err(ApiError::NotFound(format!("soil report {}", id)))
    }
}

/// DELETE /scans (clear all history)
pub async fn clear_scans(State(state): State<AppState>) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.repository.clear_all().await?;
    tracing::info!(deleted, "Soil report history cleared");
    Ok(Json(DeleteResponse { deleted }))
}

pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/scans", get(list_scans).post(create_scan).delete(clear_scans))
        .route("/scans/latest", get(latest_scan))
        .route("/scans/:id", get(get_scan).delete(delete_scan))
        .layer(DefaultBodyLimit::max(MAX_SCAN_BODY_BYTES))
}
