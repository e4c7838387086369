//! Forecast cycle and calendar-day helpers.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MarineError, MarineResult};

/// Hours at which GFS runs are initialized.
pub const GFS_CYCLE_HOURS: [u32; 4] = [0, 6, 12, 18];

/// A model run identified by its initialization date and hour (e.g. 00Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastCycle {
    pub date: NaiveDate,
    pub hour: u32,
}

impl ForecastCycle {
    /// Create a cycle, rejecting hours that are not a model cycle.
    pub fn new(date: NaiveDate, hour: u32) -> MarineResult<Self> {
        if !GFS_CYCLE_HOURS.contains(&hour) {
            return Err(MarineError::InvalidParameter {
                param: "cycle_hour".to_string(),
                message: format!("{} is not one of {:?}", hour, GFS_CYCLE_HOURS),
            });
        }
        Ok(Self { date, hour })
    }

    /// The cycle with the given hour on the current UTC date of `now`.
    pub fn on_utc_date(now: DateTime<Utc>, hour: u32) -> MarineResult<Self> {
        Self::new(now.date_naive(), hour)
    }

    /// Initialization time of the run.
    pub fn reference_time(&self) -> DateTime<Utc> {
        let midnight = self.date.and_hms_opt(0, 0, 0).unwrap_or_default();
        Utc.from_utc_datetime(&midnight) + Duration::hours(self.hour as i64)
    }

    /// Valid times for the given forecast-hour offsets, in the given order.
    pub fn valid_times(&self, forecast_hours: &[u32]) -> Vec<DateTime<Utc>> {
        let base = self.reference_time();
        forecast_hours
            .iter()
            .map(|h| base + Duration::hours(*h as i64))
            .collect()
    }

    /// Date in compact form, e.g. `20240315`.
    pub fn compact_date(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// Cycle label as used in dataset names, e.g. `00z`.
    pub fn cycle_label(&self) -> String {
        format!("{:02}z", self.hour)
    }
}

impl fmt::Display for ForecastCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{:02}Z", self.date.format("%Y-%m-%d"), self.hour)
    }
}

/// Start (inclusive) and end (exclusive) of a UTC calendar day.
pub fn utc_day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap_or_default());
    (start, start + Duration::days(1))
}
