//! The fetch → sample → render pipeline behind the live dashboard.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use grid_sampler::{ForecastSample, GridSampler, GriddedField, SampleReport, SkippedSample, VectorField};
use marine_common::{ForecastCycle, LocationTable, MarineResult};
use renderer::{build_threshold_overlays, daily_max, MapDocument};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::cache::{FetchCache, FetchCacheSnapshot};
use crate::config::{DashboardConfig, MapConfig, OverlayConfig};
use crate::source::ForecastSource;

/// Everything fetched and sampled for one page load.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub cycle: ForecastCycle,
    pub generated_at: DateTime<Utc>,
    pub report: SampleReport,
    /// Set when the wind dataset could not be used; the report is empty.
    pub wind_error: Option<String>,
    pub waves: Option<Arc<GriddedField>>,
    /// Set when wave data is unavailable; wind is unaffected.
    pub wave_error: Option<String>,
}

impl Forecast {
    /// Days with at least one sample, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.report.days()
    }

    pub fn samples_for_day(&self, day: NaiveDate) -> Vec<&ForecastSample> {
        self.report.samples_for_day(day).collect()
    }

    /// The requested day when it has data, otherwise the first day.
    pub fn select_day(&self, requested: Option<NaiveDate>) -> Option<NaiveDate> {
        let days = self.days();
        requested
            .filter(|d| days.contains(d))
            .or_else(|| days.first().copied())
    }

    pub fn summary(&self) -> ForecastSummary<'_> {
        ForecastSummary {
            cycle: self.cycle.to_string(),
            generated_at: self.generated_at,
            days: self.days(),
            samples: &self.report.samples,
            skipped: &self.report.skipped,
            missing_times: &self.report.missing_times,
            wind_error: self.wind_error.as_deref(),
            wave_error: self.wave_error.as_deref(),
            wave_times: self.waves.as_ref().map(|w| w.times().len()).unwrap_or(0),
        }
    }
}

/// JSON view of a [`Forecast`].
#[derive(Debug, Serialize)]
pub struct ForecastSummary<'a> {
    pub cycle: String,
    pub generated_at: DateTime<Utc>,
    pub days: Vec<NaiveDate>,
    pub samples: &'a [ForecastSample],
    pub skipped: &'a [SkippedSample],
    pub missing_times: &'a [DateTime<Utc>],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_error: Option<&'a str>,
    pub wave_times: usize,
}

/// Runs the pipeline with memoized fetches.
pub struct ForecastService {
    source: Arc<dyn ForecastSource>,
    locations: LocationTable,
    cycle_hour: u32,
    forecast_hours: Vec<u32>,
    sampler: GridSampler,
    overlays: OverlayConfig,
    map: MapConfig,
    wind_cache: FetchCache<Arc<VectorField>>,
    wave_cache: FetchCache<Arc<GriddedField>>,
}

impl ForecastService {
    pub fn new(config: &DashboardConfig, source: Arc<dyn ForecastSource>) -> Self {
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        Self {
            source,
            locations: config.locations.clone(),
            cycle_hour: config.wind.cycle_hour,
            forecast_hours: config.wind.forecast_hours.clone(),
            sampler: GridSampler::new(config.unit),
            overlays: config.overlays.clone(),
            map: config.map,
            wind_cache: FetchCache::new(config.cache.capacity, ttl),
            wave_cache: FetchCache::new(config.cache.capacity, ttl),
        }
    }

    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    /// Fetch wind then waves for the run of `now`'s UTC date and sample the
    /// locations. Dataset failures are recorded on the result, not
    /// returned; waves are not fetched when wind failed.
    pub async fn forecast(&self, now: DateTime<Utc>) -> MarineResult<Forecast> {
        let cycle = ForecastCycle::on_utc_date(now, self.cycle_hour)?;
        let mut forecast = Forecast {
            cycle,
            generated_at: now,
            report: SampleReport::default(),
            wind_error: None,
            waves: None,
            wave_error: None,
        };

        let wind_key = format!("wind:{}", cycle);
        let wind = self
            .wind_cache
            .get_or_try_fetch(&wind_key, || async {
                self.source.wind(&cycle, &self.locations).await.map(Arc::new)
            })
            .await;

        let field = match wind {
            Ok(field) => field,
            Err(e) => {
                error!(error = %e, cycle = %cycle, "Wind data unavailable");
                forecast.wind_error = Some(e.to_string());
                return Ok(forecast);
            }
        };

        let times = cycle.valid_times(&self.forecast_hours);
        forecast.report = self.sampler.sample(&field, &times, &self.locations);

        let today = now.date_naive();
        let wave_key = format!("waves:{}", today);
        let waves = self
            .wave_cache
            .get_or_try_fetch(&wave_key, || async {
                self.source.waves(today).await.map(Arc::new)
            })
            .await;
        match waves {
            Ok(field) => forecast.waves = Some(field),
            Err(e) => {
                warn!(error = %e, "Wave data unavailable, continuing with wind only");
                forecast.wave_error = Some(e.to_string());
            }
        }

        info!(
            cycle = %cycle,
            samples = forecast.report.samples.len(),
            skipped = forecast.report.skipped.len(),
            waves = forecast.waves.is_some(),
            "Forecast ready"
        );
        Ok(forecast)
    }

    /// Map of one day: wind markers plus the day's wave threshold overlays.
    ///
    /// CPU-bound when waves are present; call from a blocking context.
    pub fn day_map(&self, forecast: &Forecast, day: NaiveDate) -> MarineResult<MapDocument> {
        let overlays = match forecast.waves.as_deref().and_then(|w| daily_max(w, day)) {
            Some(grid) => build_threshold_overlays(
                &grid,
                &self.overlays.thresholds,
                self.overlays.fill_alpha,
            )?,
            None => Vec::new(),
        };

        Ok(MapDocument::new(
            format!("Pronóstico marítimo {}", day.format("%d %b %Y")),
            forecast.generated_at,
        )
        .with_view(self.map.view)
        .with_wind_scale(self.map.wind_scale)
        .with_overlay_opacity(self.overlays.opacity)
        .with_samples(forecast.report.samples_for_day(day))
        .with_overlays(overlays))
    }

    /// Drop memoized fetches, returning how many entries were held.
    pub async fn clear_cache(&self) -> usize {
        self.wind_cache.clear().await + self.wave_cache.clear().await
    }

    pub async fn cache_stats(&self) -> (FetchCacheSnapshot, FetchCacheSnapshot) {
        (self.wind_cache.snapshot().await, self.wave_cache.snapshot().await)
    }
}
