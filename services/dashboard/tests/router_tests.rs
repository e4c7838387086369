//! Router tests against an in-memory forecast source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use dashboard::config::DashboardConfig;
use dashboard::snapshot::{snapshot_filename, write_snapshots};
use dashboard::source::ForecastSource;
use dashboard::state::AppState;
use grid_sampler::{GriddedField, VectorField};
use marine_common::{ForecastCycle, LocationTable, MarineError, MarineResult};
use snapshot_catalog::{builtin_feeds, FeedConfig, SnapshotCatalog};
use test_utils::snapshots::*;
use test_utils::{create_axis, create_constant_field, create_wave_height_grid, temp_snapshot_dir};
use tower::ServiceExt;

// ============================================================================
// In-memory source
// ============================================================================

#[derive(Default)]
struct MemorySource {
    wind_fails: bool,
    waves_fail: bool,
    wind_calls: AtomicUsize,
    wave_calls: AtomicUsize,
}

#[async_trait]
impl ForecastSource for MemorySource {
    async fn wind(
        &self,
        cycle: &ForecastCycle,
        _locations: &LocationTable,
    ) -> MarineResult<VectorField> {
        self.wind_calls.fetch_add(1, Ordering::SeqCst);
        if self.wind_fails {
            return Err(MarineError::remote_open(
                format!("GFS {} {}", cycle.compact_date(), cycle.cycle_label()),
                "HTTP 404",
            ));
        }
        // GFS-like 0.5° grid on 0-360 longitudes, u = v = 5 m/s
        let times = cycle.valid_times(&[0, 24, 48, 72]);
        let lats = create_axis(-60.0, 0.5, 55);
        let lons = create_axis(280.0, 0.5, 61);
        let n = times.len();
        let (w, h) = (lons.len(), lats.len());
        let u = GriddedField::new(
            "ugrd10m",
            times.clone(),
            lats.clone(),
            lons.clone(),
            create_constant_field(n, w, h, 5.0),
        )?;
        let v = GriddedField::new("vgrd10m", times, lats, lons, create_constant_field(n, w, h, 5.0))?;
        VectorField::new(u, v)
    }

    async fn waves(&self, today: NaiveDate) -> MarineResult<GriddedField> {
        self.wave_calls.fetch_add(1, Ordering::SeqCst);
        if self.waves_fail {
            return Err(MarineError::Authentication {
                service: "Copernicus Marine".to_string(),
                message: "HTTP 401".to_string(),
            });
        }
        let start = Utc.from_utc_datetime(&today.and_hms_opt(0, 0, 0).unwrap());
        let times: Vec<_> = (0..10).map(|i| start + Duration::hours(12 * i)).collect();
        let lats = create_axis(-60.0, 1.0, 28);
        let lons = create_axis(-80.0, 1.0, 31);
        let mut values = Vec::new();
        for _ in 0..times.len() {
            values.extend(create_wave_height_grid(lons.len(), lats.len(), 9.0));
        }
        GriddedField::new("VHM0", times, lats, lons, values)
    }
}

struct Harness {
    app: Router,
    source: Arc<MemorySource>,
    state: Arc<AppState>,
    _dir: tempfile::TempDir,
}

fn harness(source: MemorySource, snapshot_files: &[&str]) -> Harness {
    let dir = temp_snapshot_dir(snapshot_files);
    let mut config = DashboardConfig::default();
    config.snapshots.directory = dir.path().to_path_buf();

    let source = Arc::new(source);
    let state = Arc::new(AppState::new(config, source.clone()).unwrap());
    Harness {
        app: dashboard::app(Arc::clone(&state)),
        source,
        state,
        _dir: dir,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// ============================================================================
// Health and landing
// ============================================================================

#[tokio::test]
async fn test_health() {
    let h = harness(MemorySource::default(), &[]);
    let (status, body) = get(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"ok\""));
}

#[tokio::test]
async fn test_landing_links_feeds() {
    let h = harness(MemorySource::default(), &[]);
    let (status, body) = get(&h.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/maritimo"));
    assert!(body.contains("/snapshots/combinado"));
    assert!(body.contains("/snapshots/viento-00z"));
}

// ============================================================================
// Live dashboard
// ============================================================================

#[tokio::test]
async fn test_maritime_page_renders_wind_and_waves() {
    let h = harness(MemorySource::default(), &[]);
    let (status, body) = get(&h.app, "/maritimo").await;
    assert_eq!(status, StatusCode::OK);

    assert!(body.contains("Pronóstico Marítimo Integrado"));
    assert!(body.contains("Mar del Plata"));
    assert!(body.contains("<td>13.7</td><td>225</td>"));
    assert!(body.contains("L.imageOverlay"));
    assert_eq!(body.matches("data:image/png;base64,").count(), 3);
    assert_eq!(body.matches("<option value=").count(), 4);
    assert!(!body.contains("class=\"error\""));
}

#[tokio::test]
async fn test_selected_day_is_marked() {
    let h = harness(MemorySource::default(), &[]);
    let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
    let uri = format!("/maritimo?day={}", tomorrow.format("%Y-%m-%d"));
    let (status, body) = get(&h.app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!(
        "<option value=\"{}\" selected>",
        tomorrow.format("%Y-%m-%d")
    )));
}

#[tokio::test]
async fn test_invalid_day_is_bad_request() {
    let h = harness(MemorySource::default(), &[]);
    let (status, _) = get(&h.app, "/maritimo?day=mañana").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wind_failure_shows_error_without_data() {
    let source = MemorySource {
        wind_fails: true,
        ..Default::default()
    };
    let h = harness(source, &[]);
    let (status, body) = get(&h.app, "/maritimo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No se pudo abrir el dataset GFS"));
    assert!(!body.contains("Velocidad (kt)"));
    assert_eq!(h.source.wave_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wave_failure_keeps_wind() {
    let source = MemorySource {
        waves_fail: true,
        ..Default::default()
    };
    let h = harness(source, &[]);
    let (status, body) = get(&h.app, "/maritimo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No se pudo abrir el archivo de olas"));
    assert!(body.contains("Mar del Plata"));
    assert!(!body.contains("data:image/png;base64,"));
}

// ============================================================================
// JSON API and caching
// ============================================================================

#[tokio::test]
async fn test_forecast_api() {
    let h = harness(MemorySource::default(), &[]);
    let (status, body) = get(&h.app, "/api/forecast").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let samples = json["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 11 * 4);
    for s in samples {
        assert_eq!(s["wind_direction"].as_f64().unwrap().round(), 225.0);
    }
    assert_eq!(json["days"].as_array().unwrap().len(), 4);
    assert!(json.get("wind_error").is_none());
}

#[tokio::test]
async fn test_successful_fetches_are_cached_until_cleared() {
    let h = harness(MemorySource::default(), &[]);
    get(&h.app, "/api/forecast").await;
    get(&h.app, "/api/forecast").await;
    assert_eq!(h.source.wind_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.source.wave_calls.load(Ordering::SeqCst), 1);

    let clear = Request::builder()
        .method("POST")
        .uri("/api/cache/clear")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, clear).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"cleared\":2"));

    get(&h.app, "/api/forecast").await;
    assert_eq!(h.source.wind_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_fetches_are_retried() {
    let source = MemorySource {
        wind_fails: true,
        ..Default::default()
    };
    let h = harness(source, &[]);
    let (_, body) = get(&h.app, "/api/forecast").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["wind_error"].as_str().unwrap().contains("GFS"));
    assert!(json["samples"].as_array().unwrap().is_empty());

    get(&h.app, "/api/forecast").await;
    assert_eq!(h.source.wind_calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Snapshot browser
// ============================================================================

#[tokio::test]
async fn test_snapshot_page_lists_by_date() {
    let h = harness(MemorySource::default(), &[COMBINADO_MAR_10, COMBINADO_MAR_09]);
    let (status, body) = get(&h.app, "/snapshots/combinado").await;
    assert_eq!(status, StatusCode::OK);

    let first = body.find(COMBINADO_MAR_09).unwrap();
    let second = body.find(COMBINADO_MAR_10).unwrap();
    assert!(first < second);
    assert!(body.contains("Pronóstico para 09 Mar 2024"));
    assert!(body.contains(&format!("/snapshots/combinado/raw/{}", COMBINADO_MAR_09)));
}

#[tokio::test]
async fn test_snapshot_page_selects_file() {
    let h = harness(MemorySource::default(), &[COMBINADO_MAR_10, COMBINADO_MAR_09]);
    let uri = format!("/snapshots/combinado?file={}", COMBINADO_MAR_10);
    let (status, body) = get(&h.app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("🗓️ Pronóstico para 10 Mar 2024"));

    let (status, _) = get(&h.app, "/snapshots/combinado?file=notes.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_snapshot_raw_is_unmodified() {
    let h = harness(MemorySource::default(), &[COMBINADO_MAR_09, "notes.txt"]);
    let (status, body) = get(&h.app, &format!("/snapshots/combinado/raw/{}", COMBINADO_MAR_09)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("<html>{}</html>", COMBINADO_MAR_09));

    let (status, _) = get(&h.app, "/snapshots/combinado/raw/notes.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_snapshot_iframe_url_is_percent_encoded() {
    let name = "mapa 2024-03-09 #1?.html";
    let dir = temp_snapshot_dir(&[name]);
    let mut config = DashboardConfig::default();
    config.snapshots.directory = dir.path().to_path_buf();
    config.snapshots.feeds.push(FeedConfig {
        name: "archivo".to_string(),
        title: "Archivo".to_string(),
        pattern: r"^mapa (?P<date>\d{4}-\d{2}-\d{2}) .*\.html$".to_string(),
        date_format: "%Y-%m-%d".to_string(),
        description: String::new(),
        caption: String::new(),
        empty_message: "Sin mapas.".to_string(),
    });
    let state = Arc::new(AppState::new(config, Arc::new(MemorySource::default())).unwrap());
    let app = dashboard::app(state);

    let (status, body) = get(&app, "/snapshots/archivo").await;
    assert_eq!(status, StatusCode::OK);
    let raw = "/snapshots/archivo/raw/mapa%202024-03-09%20%231%3F.html";
    assert!(body.contains(&format!(r#"src="{}""#, raw)));

    let (status, body) = get(&app, raw).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("<html>{}</html>", name));
}

#[tokio::test]
async fn test_snapshot_empty_states() {
    let h = harness(MemorySource::default(), &UNDATED);
    let (status, body) = get(&h.app, "/snapshots/viento-00z").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No hay mapas de viento disponibles."));

    let mut config = DashboardConfig::default();
    config.snapshots.directory = h._dir.path().join("missing");
    let state = Arc::new(AppState::new(config, Arc::new(MemorySource::default())).unwrap());
    let (_, body) = get(&dashboard::app(state), "/snapshots/combinado").await;
    assert!(body.contains("No se encontró la carpeta con los mapas HTML."));
}

#[tokio::test]
async fn test_unknown_feed() {
    let h = harness(MemorySource::default(), &[]);
    let (status, _) = get(&h.app, "/snapshots/mareas").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = get(&h.app, "/api/snapshots/mareas").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("\"status\":404"));
}

#[tokio::test]
async fn test_snapshot_api() {
    let h = harness(
        MemorySource::default(),
        &[COMBINADO_MAR_10, COMBINADO_MAR_09, COMBINADO_FEB_29],
    );
    let (status, body) = get(&h.app, "/api/snapshots/combinado").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let dates: Vec<&str> = json["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-02-29", "2024-03-09", "2024-03-10"]);
    assert_eq!(json["status"], "ready");
}

// ============================================================================
// Snapshot generation
// ============================================================================

#[tokio::test]
async fn test_written_snapshots_are_catalogued() {
    let h = harness(MemorySource::default(), &[]);
    let out = h.state.config.snapshots.directory.join("generated");
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap();

    let written = write_snapshots(&h.state, now, &out).await.unwrap();
    assert_eq!(written.len(), 4);
    assert!(written[0].ends_with(snapshot_filename(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())));

    let feed = builtin_feeds()[0].build().unwrap();
    let catalog = SnapshotCatalog::scan(&out, &feed.extractor).unwrap();
    assert_eq!(catalog.len(), 4);
    let html = catalog.read("mapa_combinado_2024-03-15.html").unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Actualizado: 2024-03-15 06:00 UTC"));
}

#[tokio::test]
async fn test_snapshot_generation_fails_without_wind() {
    let source = MemorySource {
        wind_fails: true,
        ..Default::default()
    };
    let h = harness(source, &[]);
    let out = h.state.config.snapshots.directory.join("generated");
    let result = write_snapshots(&h.state, Utc::now(), &out).await;
    assert!(matches!(result, Err(MarineError::DataNotAvailable(_))));
    assert!(!out.exists());
}
