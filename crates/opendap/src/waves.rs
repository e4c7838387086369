//! Copernicus Marine significant wave height with a local cache file.
//!
//! The cache file is reused whenever it exists; it never expires on its own.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use grid_sampler::GriddedField;
use marine_common::{utc_day_bounds, BoundingBox, MarineError, MarineResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::client::{AxisNames, Credentials, GridRequest, OpendapClient, Packing};
use crate::error::{OpendapError, OpendapResult};
use crate::subset::TimeSelection;
use crate::time::TimeUnits;
use crate::url::{copernicus_dataset_url, COPERNICUS_BASE, COPERNICUS_WAVE_DATASET};

/// Wave source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSourceConfig {
    pub base_url: String,
    pub dataset_id: String,
    pub variable: String,
    pub axes: AxisNames,
    pub time_units: String,
    /// Subset area, signed longitudes.
    pub bbox: BoundingBox,
    /// Days after today included in the window.
    pub days_ahead: u32,
    pub cache_file: PathBuf,
    pub fill_value: Option<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub timeout_secs: u64,
}

impl Default for WaveSourceConfig {
    fn default() -> Self {
        Self {
            base_url: COPERNICUS_BASE.to_string(),
            dataset_id: COPERNICUS_WAVE_DATASET.to_string(),
            variable: "VHM0".to_string(),
            axes: AxisNames::new("time", "latitude", "longitude"),
            time_units: "hours since 1950-01-01 00:00:00".to_string(),
            bbox: BoundingBox::new(-80.0, -60.0, -50.0, -33.0),
            days_ahead: 4,
            cache_file: PathBuf::from("olas_atlantico_sur.json"),
            fill_value: None,
            scale_factor: None,
            add_offset: None,
            timeout_secs: 300,
        }
    }
}

/// `[today 00Z, today + days_ahead + 1 day)`, whole UTC days.
pub fn wave_window(today: NaiveDate, days_ahead: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let (start, _) = utc_day_bounds(today);
    let last_day = today + chrono::Duration::days(days_ahead as i64);
    let (_, end) = utc_day_bounds(last_day);
    (start, end)
}

/// Read a cached wave field. `Ok(None)` when the file does not exist.
pub async fn load_cache(path: &Path) -> OpendapResult<Option<GriddedField>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(OpendapError::Cache(format!("{}: {}", path.display(), e))),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| OpendapError::Cache(format!("{}: {}", path.display(), e)))
}

/// Write a wave field to the cache file, creating parent directories.
pub async fn save_cache(path: &Path, field: &GriddedField) -> OpendapResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| OpendapError::Cache(format!("{}: {}", parent.display(), e)))?;
    }
    let json =
        serde_json::to_vec(field).map_err(|e| OpendapError::Cache(e.to_string()))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| OpendapError::Cache(format!("{}: {}", path.display(), e)))
}

/// Fetches significant wave height from Copernicus Marine.
#[derive(Debug, Clone)]
pub struct CopernicusWaveSource {
    client: OpendapClient,
    config: WaveSourceConfig,
    time_units: TimeUnits,
}

impl CopernicusWaveSource {
    /// Credentials are only needed when the cache file is absent.
    pub fn new(config: WaveSourceConfig, credentials: Option<Credentials>) -> MarineResult<Self> {
        let time_units = TimeUnits::parse(&config.time_units)
            .map_err(|e| MarineError::InvalidConfig(e.to_string()))?;
        let mut client = OpendapClient::new(Duration::from_secs(config.timeout_secs))
            .map_err(|e| MarineError::InternalError(e.to_string()))?;
        if let Some(credentials) = credentials {
            client = client.with_credentials(credentials);
        }
        Ok(Self {
            client,
            config,
            time_units,
        })
    }

    pub fn config(&self) -> &WaveSourceConfig {
        &self.config
    }

    pub fn dataset_url(&self) -> String {
        copernicus_dataset_url(&self.config.base_url, &self.config.dataset_id)
    }

    /// Wave heights for the window starting `today`, from the cache file
    /// when present, otherwise from the remote dataset.
    #[instrument(skip(self), fields(dataset = %self.config.dataset_id))]
    pub async fn fetch(&self, today: NaiveDate) -> MarineResult<GriddedField> {
        let dataset = self.config.dataset_id.as_str();
        let cache = self.config.cache_file.as_path();

        match load_cache(cache).await {
            Ok(Some(field)) => {
                debug!(path = %cache.display(), "Using cached wave data");
                return Ok(field);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable wave cache"),
        }

        if !self.client.has_credentials() {
            return Err(OpendapError::MissingCredentials(
                "COPERNICUS_USERNAME / COPERNICUS_PASSWORD".to_string(),
            )
            .into_marine(dataset));
        }

        let (start, end) = wave_window(today, self.config.days_ahead);
        let request = GridRequest {
            variables: vec![self.config.variable.clone()],
            axes: self.config.axes.clone(),
            time_units: self.time_units.clone(),
            times: TimeSelection::Window { start, end },
            bbox: self.config.bbox,
            margin_cells: 0,
            packing: Packing {
                fill_value: self.config.fill_value,
                scale_factor: self.config.scale_factor,
                add_offset: self.config.add_offset,
            },
        };

        let field = self
            .client
            .fetch_grids(&self.dataset_url(), &request)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch wave data");
                e.into_marine(dataset)
            })?
            .pop()
            .ok_or_else(|| MarineError::MalformedData(format!("{}: no wave field", dataset)))?;

        if field.times().is_empty() {
            return Err(MarineError::DataNotAvailable(format!(
                "{}: no time steps between {} and {}",
                dataset, start, end
            )));
        }

        if let Err(e) = save_cache(cache, &field).await {
            warn!(error = %e, "Could not write wave cache");
        } else {
            info!(path = %cache.display(), times = field.times().len(), "Wave data cached");
        }
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_field() -> GriddedField {
        let t = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        GriddedField::new(
            "VHM0",
            vec![t],
            vec![-40.0, -39.9],
            vec![-60.0, -59.9],
            vec![2.5, f32::NAN, 4.25, 6.5],
        )
        .unwrap()
    }

    #[test]
    fn test_wave_window_covers_whole_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = wave_window(today, 4);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_cache_roundtrip_keeps_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("olas.json");

        assert!(load_cache(&path).await.unwrap().is_none());
        save_cache(&path, &sample_field()).await.unwrap();

        let cached = load_cache(&path).await.unwrap().unwrap();
        assert_eq!(cached.value(0, 0, 0), Some(2.5));
        assert_eq!(cached.value(0, 0, 1), None);
        assert_eq!(cached.value(0, 1, 1), Some(6.5));
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("olas.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(matches!(load_cache(&path).await, Err(OpendapError::Cache(_))));
    }

    #[tokio::test]
    async fn test_cache_used_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("olas.json");
        save_cache(&path, &sample_field()).await.unwrap();

        let source = CopernicusWaveSource::new(
            WaveSourceConfig {
                cache_file: path,
                ..WaveSourceConfig::default()
            },
            None,
        )
        .unwrap();
        let field = source
            .fetch(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .await
            .unwrap();
        assert_eq!(field.variable, "VHM0");
    }

    #[tokio::test]
    async fn test_missing_credentials_without_cache() {
        let dir = tempfile::tempdir().unwrap();
        let source = CopernicusWaveSource::new(
            WaveSourceConfig {
                cache_file: dir.path().join("absent.json"),
                ..WaveSourceConfig::default()
            },
            None,
        )
        .unwrap();
        let err = source
            .fetch(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .await
            .unwrap_err();
        assert!(err.is_authentication());
    }
}
