//! Landing page and the live wind and wave dashboard.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{Html, IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use marine_common::{MarineError, MarineResult};
use serde::Deserialize;
use tracing::instrument;

use crate::forecast::Forecast;
use crate::handlers::page_error;
use crate::pages::{self, MaritimeView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub day: Option<String>,
}

/// GET / - Links to every dashboard
pub async fn landing_handler(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    Html(pages::landing_page(&state.config.links, &state.feeds))
}

fn parse_day(raw: Option<&str>) -> MarineResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| MarineError::InvalidParameter {
                param: "day".to_string(),
                message: format!("'{}' is not a YYYY-MM-DD date", s),
            }),
    }
}

/// Map fragment and legend for `day`, rendered off the async runtime.
async fn render_day(
    state: Arc<AppState>,
    forecast: Forecast,
    day: NaiveDate,
) -> MarineResult<(String, String)> {
    tokio::task::spawn_blocking(move || -> MarineResult<(String, String)> {
        let doc = state.forecast.day_map(&forecast, day)?;
        let fragment = doc.render_fragment("mapa", "600px")?;
        Ok((fragment, doc.legend_html()))
    })
    .await
    .map_err(|e| MarineError::InternalError(format!("render task failed: {}", e)))?
}

/// GET /maritimo?day=YYYY-MM-DD - Live dashboard
#[instrument(skip(state))]
pub async fn maritime_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<DayQuery>,
) -> Response {
    let links = &state.config.links;
    let requested = match parse_day(query.day.as_deref()) {
        Ok(day) => day,
        Err(e) => return page_error(links, &e),
    };

    let forecast = match state.forecast.forecast(Utc::now()).await {
        Ok(f) => f,
        Err(e) => return page_error(links, &e),
    };
    let day = forecast.select_day(requested);

    let mut view = MaritimeView {
        forecast: &forecast,
        day,
        map_html: None,
        legend_html: None,
        render_error: None,
    };
    if let Some(day) = day {
        match render_day(Arc::clone(&state), forecast.clone(), day).await {
            Ok((map, legend)) => {
                view.map_html = Some(map);
                view.legend_html = Some(legend);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to render map");
                view.render_error = Some(e.to_string());
            }
        }
    }

    Html(pages::maritime_page(links, &view)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day(None).unwrap(), None);
        assert_eq!(parse_day(Some("")).unwrap(), None);
        assert_eq!(
            parse_day(Some("2024-03-15")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert!(matches!(
            parse_day(Some("15/03/2024")),
            Err(MarineError::InvalidParameter { .. })
        ));
    }
}
