//! Marine forecast dashboard service.
//!
//! Serves the live wind and wave dashboard, the snapshot browsers and a
//! small JSON API, and generates the snapshots the browsers list.

pub mod cache;
pub mod config;
pub mod forecast;
pub mod handlers;
pub mod pages;
pub mod snapshot;
pub mod source;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::state::AppState;

/// Routes of the service, without the HTTP middleware stack.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(handlers::maritime::landing_handler))
        .route("/maritimo", get(handlers::maritime::maritime_handler))
        .route(
            "/snapshots/:feed",
            get(handlers::snapshots::snapshot_page_handler),
        )
        .route(
            "/snapshots/:feed/raw/:file",
            get(handlers::snapshots::snapshot_raw_handler),
        )
        // JSON API
        .route("/api/forecast", get(handlers::api::forecast_handler))
        .route(
            "/api/snapshots/:feed",
            get(handlers::snapshots::snapshot_list_handler),
        )
        .route("/api/cache", get(handlers::api::cache_stats_handler))
        .route("/api/cache/clear", post(handlers::api::cache_clear_handler))
        // Health
        .route("/health", get(handlers::health::health_handler))
        .layer(Extension(state))
}
