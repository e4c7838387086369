//! JSON endpoints: sampled forecast and cache management.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use chrono::Utc;
use marine_common::MarineError;
use tracing::{info, instrument};

use crate::handlers::ApiError;
use crate::state::AppState;

/// GET /api/forecast - Sample report of the current run
///
/// Dataset failures are reported in the body, not as an HTTP error.
#[instrument(skip(state))]
pub async fn forecast_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let forecast = state.forecast.forecast(Utc::now()).await?;
    let body = serde_json::to_value(forecast.summary())
        .map_err(|e| MarineError::InternalError(e.to_string()))?;
    Ok(Json(body))
}

/// GET /api/cache - Fetch cache statistics
#[instrument(skip(state))]
pub async fn cache_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let (wind, waves) = state.forecast.cache_stats().await;
    Json(serde_json::json!({
        "ttl_secs": state.config.cache.ttl_secs,
        "wind": wind,
        "waves": waves,
    }))
}

/// POST /api/cache/clear - Drop memoized fetches
#[instrument(skip(state))]
pub async fn cache_clear_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let cleared = state.forecast.clear_cache().await;
    info!(cleared, "Cleared fetch cache");
    Json(serde_json::json!({ "cleared": cleared }))
}
