//! Nearest-neighbor sampling of wind fields at named locations.

use chrono::{DateTime, NaiveDate, Utc};
use marine_common::{Location, LocationTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::field::{Axis, AxisLookupError, VectorField};
use crate::wind::{uv_to_polar, SpeedUnit};

/// Wind at one location and time.
///
/// `latitude`/`longitude` are the location's own coordinates in the signed
/// convention, never the grid cell's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub unit: SpeedUnit,
}

impl ForecastSample {
    /// UTC calendar day of the sample.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Why a (time, location) pair produced no sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The coordinate lies outside the grid on the given axis.
    OutOfRange { axis: Axis, value: f64 },
    /// The coordinate is NaN or infinite.
    InvalidCoordinate { axis: Axis },
    /// The nearest cell holds NaN or the fill value.
    MissingValue,
}

/// A pair that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSample {
    pub location: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of sampling one (time, location) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Sampled(ForecastSample),
    Skipped(SkippedSample),
}

/// Aggregated outcomes of one sampling batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleReport {
    /// Samples in (timestamp, location table) order.
    pub samples: Vec<ForecastSample>,
    pub skipped: Vec<SkippedSample>,
    /// Requested timestamps that are not on the field's time axis.
    pub missing_times: Vec<DateTime<Utc>>,
}

impl SampleReport {
    pub fn push(&mut self, outcome: SampleOutcome) {
        match outcome {
            SampleOutcome::Sampled(sample) => self.samples.push(sample),
            SampleOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Distinct UTC days present in the samples, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self.samples.iter().map(ForecastSample::day).collect();
        days.sort();
        days.dedup();
        days
    }

    /// Samples whose timestamp falls on `day`.
    pub fn samples_for_day(&self, day: NaiveDate) -> impl Iterator<Item = &ForecastSample> {
        self.samples.iter().filter(move |s| s.day() == day)
    }
}

/// Samples wind fields at fixed locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridSampler {
    unit: SpeedUnit,
}

impl GridSampler {
    pub fn new(unit: SpeedUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> SpeedUnit {
        self.unit
    }

    /// Sample every (time, location) pair.
    ///
    /// Times absent from the field are recorded in `missing_times` and
    /// produce no outcomes. Failing pairs are skipped, never fatal.
    pub fn sample(
        &self,
        field: &VectorField,
        times: &[DateTime<Utc>],
        locations: &LocationTable,
    ) -> SampleReport {
        let mut report = SampleReport::default();

        for t in times {
            let Some(ti) = field.u.time_index(t) else {
                debug!(time = %t, "Requested time not in dataset, skipping");
                report.missing_times.push(*t);
                continue;
            };

            for location in locations {
                report.push(self.sample_at(field, ti, *t, location));
            }
        }

        debug!(
            samples = report.samples.len(),
            skipped = report.skipped.len(),
            missing_times = report.missing_times.len(),
            "Sampling finished"
        );
        report
    }

    /// Sample a single location at time index `ti`.
    pub fn sample_at(
        &self,
        field: &VectorField,
        ti: usize,
        timestamp: DateTime<Utc>,
        location: &Location,
    ) -> SampleOutcome {
        let skip = |reason: SkipReason| {
            debug!(
                location = %location.name,
                time = %timestamp,
                reason = ?reason,
                "Skipping sample"
            );
            SampleOutcome::Skipped(SkippedSample {
                location: location.name.clone(),
                timestamp,
                reason,
            })
        };

        let yi = match field.u.nearest_lat_index(location.latitude) {
            Ok(i) => i,
            Err(e) => return skip(lookup_reason(Axis::Latitude, e)),
        };
        let grid_lon = location.grid_longitude(field.u.longitude_convention());
        let xi = match field.u.nearest_lon_index(grid_lon) {
            Ok(i) => i,
            Err(e) => return skip(lookup_reason(Axis::Longitude, e)),
        };

        let Some((u, v)) = field.vector(ti, yi, xi) else {
            return skip(SkipReason::MissingValue);
        };

        let polar = uv_to_polar(u as f64, v as f64, self.unit);
        SampleOutcome::Sampled(ForecastSample {
            location: location.name.clone(),
            timestamp,
            wind_speed: polar.speed,
            wind_direction: polar.direction,
            latitude: location.latitude,
            longitude: location.longitude,
            unit: self.unit,
        })
    }
}

fn lookup_reason(axis: Axis, err: AxisLookupError) -> SkipReason {
    match err {
        AxisLookupError::NotFinite => SkipReason::InvalidCoordinate { axis },
        AxisLookupError::OutOfRange { value, .. } => SkipReason::OutOfRange { axis, value },
    }
}
