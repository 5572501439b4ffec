//! Error types for mitti-scan
//!
//! `ScanError` is the pipeline taxonomy. Adapter and classifier failures are
//! absorbed by the fusion engine; only persistence failures, merge invariant
//! violations and cancellation reach the caller of a scan.
//!
//! `ApiError` maps failures onto HTTP responses for the local service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Scan pipeline error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    /// No coordinates available (location permission denied)
    #[error("Location unavailable: no coordinates supplied")]
    PermissionDenied,

    /// Upstream call exceeded its time budget
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, DNS or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Upstream answered with a non-success HTTP status
    #[error("Upstream returned HTTP {0}")]
    Upstream(u16),

    /// Classifier model file missing or malformed
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Image decoding or model evaluation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Report could not be written to the analysis repository
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Merge step produced an impossible report
    #[error("Merge invariant violated: {0}")]
    MergeInvariant(String),

    /// Caller supplied invalid input (e.g. out-of-range coordinates)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scan cancelled before the merge barrier resolved
    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// True for failures the engine replaces with a cached or default value
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::PermissionDenied
                | ScanError::Timeout(_)
                | ScanError::Network(_)
                | ScanError::Parse(_)
                | ScanError::Upstream(_)
                | ScanError::ModelLoad(_)
                | ScanError::Inference(_)
        )
    }
}

/// Result type for scan pipeline operations
pub type ScanResult<T> = Result<T, ScanError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Scan pipeline error
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// mitti-common error (storage, configuration)
    #[error("Common error: {0}")]
    Common(#[from] mitti_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Scan(ref err) => {
                let (status, code) = match err {
                    ScanError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                    ScanError::Persistence(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_ERROR")
                    }
                    ScanError::Cancelled => (StatusCode::CONFLICT, "CANCELLED"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "SCAN_ERROR"),
                };
                (status, code, err.to_string())
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environmental_failures_are_recoverable() {
        assert!(ScanError::PermissionDenied.is_recoverable());
        assert!(ScanError::Timeout(Duration::from_secs(10)).is_recoverable());
        assert!(ScanError::Network("reset".into()).is_recoverable());
        assert!(ScanError::Parse("bad json".into()).is_recoverable());
        assert!(ScanError::Upstream(503).is_recoverable());
        assert!(ScanError::ModelLoad("missing".into()).is_recoverable());
        assert!(ScanError::Inference("shape".into()).is_recoverable());
    }

    #[test]
    fn test_pipeline_failures_are_not_recoverable() {
        assert!(!ScanError::Persistence("disk full".into()).is_recoverable());
        assert!(!ScanError::MergeInvariant("NaN".into()).is_recoverable());
        assert!(!ScanError::Cancelled.is_recoverable());
    }

    #[test]
    fn test_persistence_error_maps_to_503() {
        let response = ApiError::from(ScanError::Persistence("locked".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let response = ApiError::from(ScanError::InvalidInput("lat".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
