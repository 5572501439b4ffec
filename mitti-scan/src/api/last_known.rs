//! Last-known cache values for screens that do not run a scan
//!
//! GET /cache/last-known

use axum::{extract::State, routing::get, Json, Router};

use crate::cache::{last_known, LastKnown};
use crate::error::ApiResult;
use crate::AppState;

pub async fn get_last_known(State(state): State<AppState>) -> ApiResult<Json<LastKnown>> {
    let values = last_known(state.cache.as_ref()).await?;
    Ok(Json(values))
}

pub fn last_known_routes() -> Router<AppState> {
    Router::new().route("/cache/last-known", get(get_last_known))
}
