//! Client tests against a local HTTP server that answers like the GrADS
//! Data Server and THREDDS.

use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{NaiveDate, TimeZone, Utc};
use grid_sampler::{GridSampler, SpeedUnit};
use marine_common::{ForecastCycle, Location, LocationTable, MarineError};
use opendap::{
    CopernicusWaveSource, Credentials, GfsWindSource, WaveSourceConfig, WindSourceConfig,
};
use regex::Regex;
use test_utils::{assert_approx_eq, fixtures::opendap as responses};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn query(uri: &Uri) -> String {
    uri.query()
        .unwrap_or_default()
        .replace("%5B", "[")
        .replace("%5D", "]")
}

/// GrADS-style body for `name` with every value set to `value`.
fn grads_array(name: &str, dims: &[usize], value: f64) -> String {
    let header: String = dims.iter().map(|d| format!("[{}]", d)).collect();
    let mut out = format!("{}, {}\n", name, header);
    let row_len = dims[dims.len() - 1];
    let rows = dims.iter().product::<usize>() / row_len;
    for row in 0..rows {
        let mut idx = Vec::new();
        let mut rem = row;
        for d in dims[..dims.len() - 1].iter().rev() {
            idx.push(rem % d);
            rem /= d;
        }
        idx.reverse();
        let prefix: String = idx.iter().map(|i| format!("[{}]", i)).collect();
        let values = vec![value.to_string(); row_len].join(", ");
        out.push_str(&format!("{}, {}\n", prefix, values));
    }
    out
}

fn hyperslab_dims(q: &str) -> (String, Vec<usize>) {
    let name = q.split('[').next().unwrap_or_default().to_string();
    let re = Regex::new(r"\[(\d+):(?:(\d+):)?(\d+)\]").unwrap();
    let dims = re
        .captures_iter(q)
        .map(|c| {
            let start: usize = c[1].parse().unwrap();
            let stride: usize = c.get(2).map_or(1, |m| m.as_str().parse().unwrap());
            let stop: usize = c[3].parse().unwrap();
            (stop - start) / stride + 1
        })
        .collect();
    (name, dims)
}

async fn grads_server(uri: Uri) -> Response {
    if uri.path() != "/dods/gfs_0p25/gfs20240315/gfs_0p25_00z.ascii" {
        return (StatusCode::NOT_FOUND, responses::GRADS_MISSING_DATASET).into_response();
    }
    let q = query(&uri);
    if q == "time,lat,lon" {
        return responses::GRADS_AXES.into_response();
    }
    let (name, dims) = hyperslab_dims(&q);
    match name.as_str() {
        "ugrd10m" | "vgrd10m" => grads_array(&name, &dims, 5.0).into_response(),
        _ => (StatusCode::BAD_REQUEST, "unknown variable").into_response(),
    }
}

async fn thredds_server(uri: Uri, headers: HeaderMap) -> Response {
    if !headers.contains_key("authorization") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let q = query(&uri);
    if q == "time,latitude,longitude" {
        return "time[1]\n1710460800.0\nlatitude[2]\n-40.0, -39.916668\nlongitude[2]\n-60.0, -59.916668\n"
            .into_response();
    }
    if q.starts_with("VHM0[0:0][0:1][0:1]") {
        return responses::THREDDS_VHM0.into_response();
    }
    (StatusCode::BAD_REQUEST, "unexpected constraint").into_response()
}

fn cycle() -> ForecastCycle {
    ForecastCycle::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 0).unwrap()
}

fn mar_del_plata() -> LocationTable {
    LocationTable::new(vec![Location::new("Mar del Plata", -38.03, -57.5)]).unwrap()
}

// ============================================================================
// GFS wind
// ============================================================================

#[tokio::test]
async fn test_wind_fetch_and_sample() {
    let base = spawn(Router::new().fallback(grads_server)).await;
    let source = GfsWindSource::new(WindSourceConfig {
        base_url: format!("{}/dods/gfs_0p25", base),
        forecast_hours: vec![0, 24, 48],
        ..WindSourceConfig::default()
    })
    .unwrap();

    let locations = mar_del_plata();
    let field = source.fetch(&cycle(), &locations).await.unwrap();
    assert_eq!(field.times().len(), 2);

    let times = cycle().valid_times(&[0, 24, 48]);
    let report = GridSampler::new(SpeedUnit::Knots).sample(&field, &times, &locations);

    assert_eq!(report.samples.len(), 2);
    assert_eq!(report.missing_times.len(), 1);
    for sample in &report.samples {
        assert_approx_eq!(sample.wind_direction, 225.0, 1e-6);
        assert_approx_eq!(sample.wind_speed, 13.745, 0.01);
    }
    assert_eq!(
        report.samples[1].timestamp,
        Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_wind_missing_dataset_is_remote_open_error() {
    let base = spawn(Router::new().fallback(grads_server)).await;
    let source = GfsWindSource::new(WindSourceConfig {
        base_url: format!("{}/dods/gfs_0p25", base),
        ..WindSourceConfig::default()
    })
    .unwrap();
    let other_day = ForecastCycle::new(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(), 0).unwrap();

    let err = source.fetch(&other_day, &mar_del_plata()).await.unwrap_err();
    match err {
        MarineError::RemoteOpen { dataset, .. } => assert_eq!(dataset, "GFS 20240316 00z"),
        other => panic!("unexpected error: {:?}", other),
    }
}

// ============================================================================
// Copernicus waves
// ============================================================================

#[tokio::test]
async fn test_wave_fetch_with_credentials_writes_cache() {
    let base = spawn(Router::new().fallback(thredds_server)).await;
    let dir = tempfile::tempdir().unwrap();
    let cache_file = dir.path().join("olas.json");
    let config = WaveSourceConfig {
        base_url: base,
        dataset_id: "waves".to_string(),
        time_units: "seconds since 1970-01-01 00:00:00".to_string(),
        cache_file: cache_file.clone(),
        ..WaveSourceConfig::default()
    };
    let source =
        CopernicusWaveSource::new(config, Some(Credentials::new("user", "secret"))).unwrap();

    let field = source
        .fetch(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        .await
        .unwrap();

    assert_eq!(field.shape(), (1, 2, 2));
    assert_eq!(field.value(0, 1, 1), Some(6.5));
    assert_eq!(field.value(0, 0, 1), None);
    assert!(cache_file.exists());
}

#[tokio::test]
async fn test_wave_rejected_credentials_is_authentication_error() {
    let base = spawn(Router::new().fallback(|| async { StatusCode::UNAUTHORIZED })).await;
    let dir = tempfile::tempdir().unwrap();
    let config = WaveSourceConfig {
        base_url: base,
        cache_file: dir.path().join("olas.json"),
        ..WaveSourceConfig::default()
    };
    let source = CopernicusWaveSource::new(config, Some(Credentials::new("user", "wrong"))).unwrap();

    let err = source
        .fetch(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}
