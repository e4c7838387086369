//! GFS 0.25° 10 m wind from the NOMADS GrADS Data Server.

use std::time::Duration;

use grid_sampler::VectorField;
use marine_common::{ForecastCycle, LocationTable, MarineError, MarineResult};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::client::{AxisNames, GridRequest, OpendapClient, Packing};
use crate::subset::TimeSelection;
use crate::time::TimeUnits;
use crate::url::{gfs_dataset_url, NOMADS_GFS_BASE};

/// Time units of every GrADS Data Server time axis.
pub const GRADS_TIME_UNITS: &str = "days since 1-1-1 00:00:0.0";

/// Wind source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindSourceConfig {
    pub base_url: String,
    /// Run initialization hour (0, 6, 12 or 18).
    pub cycle_hour: u32,
    /// Offsets from the run start, in hours.
    pub forecast_hours: Vec<u32>,
    pub u_variable: String,
    pub v_variable: String,
    pub axes: AxisNames,
    pub time_units: String,
    pub fill_value: Option<f64>,
    /// Grid cells fetched beyond the locations' bounding box.
    pub margin_cells: usize,
    pub timeout_secs: u64,
}

impl Default for WindSourceConfig {
    fn default() -> Self {
        Self {
            base_url: NOMADS_GFS_BASE.to_string(),
            cycle_hour: 0,
            forecast_hours: vec![0, 24, 48, 72],
            u_variable: "ugrd10m".to_string(),
            v_variable: "vgrd10m".to_string(),
            axes: AxisNames::default(),
            time_units: GRADS_TIME_UNITS.to_string(),
            fill_value: Some(9.999e20),
            margin_cells: 1,
            timeout_secs: 120,
        }
    }
}

/// Fetches U/V wind for one GFS run around a set of locations.
#[derive(Debug, Clone)]
pub struct GfsWindSource {
    client: OpendapClient,
    config: WindSourceConfig,
    time_units: TimeUnits,
}

impl GfsWindSource {
    pub fn new(config: WindSourceConfig) -> MarineResult<Self> {
        let time_units = TimeUnits::parse(&config.time_units)
            .map_err(|e| MarineError::InvalidConfig(e.to_string()))?;
        let client = OpendapClient::new(Duration::from_secs(config.timeout_secs))
            .map_err(|e| MarineError::InternalError(e.to_string()))?;
        Ok(Self {
            client,
            config,
            time_units,
        })
    }

    pub fn config(&self) -> &WindSourceConfig {
        &self.config
    }

    pub fn dataset_url(&self, cycle: &ForecastCycle) -> String {
        gfs_dataset_url(&self.config.base_url, cycle)
    }

    /// Fetch the configured forecast hours of `cycle` around `locations`.
    ///
    /// Forecast hours missing from the run are absent from the returned
    /// field's time axis.
    #[instrument(skip(self, locations), fields(cycle = %cycle))]
    pub async fn fetch(
        &self,
        cycle: &ForecastCycle,
        locations: &LocationTable,
    ) -> MarineResult<VectorField> {
        let dataset = format!("GFS {} {}", cycle.compact_date(), cycle.cycle_label());
        let bbox = locations.bounding_box().ok_or_else(|| {
            MarineError::InvalidConfig("location table is empty".to_string())
        })?;

        let request = GridRequest {
            variables: vec![self.config.u_variable.clone(), self.config.v_variable.clone()],
            axes: self.config.axes.clone(),
            time_units: self.time_units.clone(),
            times: TimeSelection::Exact(cycle.valid_times(&self.config.forecast_hours)),
            bbox,
            margin_cells: self.config.margin_cells,
            packing: Packing {
                fill_value: self.config.fill_value,
                ..Packing::default()
            },
        };

        let url = self.dataset_url(cycle);
        let mut fields = match self.client.fetch_grids(&url, &request).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to open wind dataset");
                return Err(e.into_marine(&dataset));
            }
        };

        let v = fields.pop();
        let u = fields.pop();
        let (Some(u), Some(v)) = (u, v) else {
            return Err(MarineError::MalformedData(format!(
                "{}: expected two wind components",
                dataset
            )));
        };

        info!(times = u.times().len(), "Wind field loaded");
        VectorField::new(u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_default_config() {
        let config = WindSourceConfig::default();
        assert_eq!(config.forecast_hours, vec![0, 24, 48, 72]);
        assert_eq!(config.u_variable, "ugrd10m");
        assert!(TimeUnits::parse(&config.time_units).is_ok());
    }

    #[test]
    fn test_dataset_url_uses_base() {
        let source = GfsWindSource::new(WindSourceConfig {
            base_url: "http://localhost:9090/dods/gfs_0p25".to_string(),
            ..WindSourceConfig::default()
        })
        .unwrap();
        let cycle = ForecastCycle::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 0).unwrap();
        assert_eq!(
            source.dataset_url(&cycle),
            "http://localhost:9090/dods/gfs_0p25/gfs20240315/gfs_0p25_00z"
        );
    }

    #[test]
    fn test_invalid_time_units_rejected() {
        let result = GfsWindSource::new(WindSourceConfig {
            time_units: "whenever".to_string(),
            ..WindSourceConfig::default()
        });
        assert!(matches!(result, Err(MarineError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_partial_yaml_like_json() {
        let config: WindSourceConfig =
            serde_json::from_str(r#"{"cycle_hour": 12, "forecast_hours": [0, 6]}"#).unwrap();
        assert_eq!(config.cycle_hour, 12);
        assert_eq!(config.v_variable, "vgrd10m");
    }
}
