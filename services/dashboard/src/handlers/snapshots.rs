//! Snapshot catalog browser and raw snapshot access.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use marine_common::MarineError;
use serde::Deserialize;
use tracing::instrument;

use crate::handlers::{page_error, ApiError};
use crate::pages;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub file: Option<String>,
}

/// GET /snapshots/:feed?file=<name> - Catalog browser
#[instrument(skip(state))]
pub async fn snapshot_page_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(feed_name): Path<String>,
    Query(query): Query<FileQuery>,
) -> Response {
    let links = &state.config.links;
    let result = state
        .feed(&feed_name)
        .and_then(|feed| Ok((feed, state.catalog(feed)?)));
    let (feed, catalog) = match result {
        Ok(found) => found,
        Err(e) => return page_error(links, &e),
    };

    let selected = match query.file.as_deref() {
        Some(name) => match catalog.entry(name) {
            Some(entry) => Some(entry),
            None => return page_error(links, &MarineError::SnapshotNotFound(name.to_string())),
        },
        None => catalog.first(),
    };

    Html(pages::snapshot_page(links, feed, &catalog, selected)).into_response()
}

/// GET /snapshots/:feed/raw/:file - Snapshot text, unmodified
#[instrument(skip(state))]
pub async fn snapshot_raw_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((feed_name, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let feed = state.feed(&feed_name)?;
    let catalog = state.catalog(feed)?;
    let body = catalog.read(&file).map_err(MarineError::from)?;
    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response())
}

/// GET /api/snapshots/:feed - Catalog entries as JSON
#[instrument(skip(state))]
pub async fn snapshot_list_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(feed_name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let feed = state.feed(&feed_name)?;
    let catalog = state.catalog(feed)?;
    Ok(Json(serde_json::json!({
        "feed": feed.name,
        "status": catalog.status(),
        "entries": catalog.entries(),
    })))
}
