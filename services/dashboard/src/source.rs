//! Remote forecast data behind a trait, so the pipeline can run against
//! in-memory fields in tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use grid_sampler::{GriddedField, VectorField};
use marine_common::{ForecastCycle, LocationTable, MarineResult};
use opendap::{CopernicusWaveSource, Credentials, GfsWindSource, WaveSourceConfig, WindSourceConfig};
use tracing::warn;

/// Provider of the wind and wave fields.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// U/V wind of one model run around `locations`.
    async fn wind(&self, cycle: &ForecastCycle, locations: &LocationTable)
        -> MarineResult<VectorField>;

    /// Significant wave height for the window starting `today`.
    async fn waves(&self, today: NaiveDate) -> MarineResult<GriddedField>;
}

/// GFS wind from NOMADS and Copernicus Marine waves, both over OPeNDAP.
pub struct OpendapSource {
    wind: GfsWindSource,
    waves: CopernicusWaveSource,
}

impl OpendapSource {
    /// Credentials come from the environment; without them waves can still
    /// be served from the cache file.
    pub fn new(wind: WindSourceConfig, waves: WaveSourceConfig) -> MarineResult<Self> {
        let credentials = match Credentials::from_env() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(error = %e, "Copernicus credentials not configured");
                None
            }
        };
        Ok(Self {
            wind: GfsWindSource::new(wind)?,
            waves: CopernicusWaveSource::new(waves, credentials)?,
        })
    }
}

#[async_trait]
impl ForecastSource for OpendapSource {
    async fn wind(
        &self,
        cycle: &ForecastCycle,
        locations: &LocationTable,
    ) -> MarineResult<VectorField> {
        self.wind.fetch(cycle, locations).await
    }

    async fn waves(&self, today: NaiveDate) -> MarineResult<GriddedField> {
        self.waves.fetch(today).await
    }
}
