//! HTTP request handlers for the dashboard.

pub mod api;
pub mod health;
pub mod maritime;
pub mod snapshots;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use marine_common::MarineError;

use crate::config::LinkConfig;
use crate::pages;

fn status_of(err: &MarineError) -> StatusCode {
    StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// JSON error body for `/api` routes.
pub struct ApiError(pub MarineError);

impl From<MarineError> for ApiError {
    fn from(err: MarineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

/// HTML error page with the matching status code.
pub(crate) fn page_error(links: &LinkConfig, err: &MarineError) -> Response {
    tracing::warn!(error = %err, "Request failed");
    (status_of(err), Html(pages::error_page(links, &err.to_string()))).into_response()
}
