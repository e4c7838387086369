//! CF-style time axis decoding (`<unit> since <reference>`).
//!
//! References before the Gregorian reform (1582-10-15) are read in the
//! Julian calendar, as the GrADS Data Server's `days since 1-1-1` axis
//! requires: day 738961.0 is 2024-03-15T00:00Z.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::error::{OpendapError, OpendapResult};

/// Unit of a time axis offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn seconds(self) -> f64 {
        match self {
            TimeUnit::Days => 86_400.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Seconds => 1.0,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => Some(TimeUnit::Days),
            "hours" | "hour" | "hrs" | "h" => Some(TimeUnit::Hours),
            "minutes" | "minute" | "mins" | "min" => Some(TimeUnit::Minutes),
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeUnit::Seconds),
            _ => None,
        }
    }
}

/// A parsed `units` attribute of a time coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeUnits {
    raw: String,
    unit: TimeUnit,
    epoch: DateTime<Utc>,
}

fn units_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*([a-z]+)\s+since\s+(-?\d{1,4})-(\d{1,2})-(\d{1,2})(?:[ T](\d{1,2}):(\d{1,2})(?::(\d{1,2})(?:\.\d*)?)?)?\s*(?:z|utc)?\s*$",
        )
        .expect("time units pattern is valid")
    })
}

/// Julian calendar date to the equivalent proleptic Gregorian date.
fn julian_to_gregorian(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let a = (14 - month as i64) / 12;
    let y = year as i64 + 4800 - a;
    let m = month as i64 + 12 * a - 3;
    let jdn = day as i64 + (153 * m + 2) / 5 + 365 * y + y / 4 - 32083;
    // JDN 1721426 is 0001-01-01 in the proleptic Gregorian calendar
    NaiveDate::from_num_days_from_ce_opt((jdn - 1_721_425) as i32)
}

impl TimeUnits {
    pub fn parse(s: &str) -> OpendapResult<Self> {
        let invalid = || OpendapError::InvalidTimeUnits(s.to_string());
        let caps = units_regex().captures(s).ok_or_else(invalid)?;

        let unit = TimeUnit::parse(&caps[1]).ok_or_else(invalid)?;
        let year: i32 = caps[2].parse().map_err(|_| invalid())?;
        let month: u32 = caps[3].parse().map_err(|_| invalid())?;
        let day: u32 = caps[4].parse().map_err(|_| invalid())?;
        let field = |i: usize| -> OpendapResult<u32> {
            caps.get(i)
                .map_or(Ok(0), |m| m.as_str().parse().map_err(|_| invalid()))
        };
        let (hour, minute, second) = (field(5)?, field(6)?, field(7)?);

        let gregorian = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        let reform = NaiveDate::from_ymd_opt(1582, 10, 15).ok_or_else(invalid)?;
        let date = if gregorian < reform {
            julian_to_gregorian(year, month, day).ok_or_else(invalid)?
        } else {
            gregorian
        };

        let naive = date
            .and_hms_opt(hour, minute, second)
            .ok_or_else(invalid)?;

        Ok(Self {
            raw: s.to_string(),
            unit,
            epoch: Utc.from_utc_datetime(&naive),
        })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Decode one axis value. Offsets are rounded to the nearest second.
    pub fn decode(&self, value: f64) -> OpendapResult<DateTime<Utc>> {
        if !value.is_finite() {
            return Err(OpendapError::Malformed(format!(
                "non-finite time value {}",
                value
            )));
        }
        let seconds = (value * self.unit.seconds()).round();
        if seconds.abs() > 1e15 {
            return Err(OpendapError::Malformed(format!("time value {} out of range", value)));
        }
        self.epoch
            .checked_add_signed(Duration::seconds(seconds as i64))
            .ok_or_else(|| OpendapError::Malformed(format!("time value {} out of range", value)))
    }

    pub fn decode_axis(&self, values: &[f64]) -> OpendapResult<Vec<DateTime<Utc>>> {
        values.iter().map(|v| self.decode(*v)).collect()
    }
}

impl FromStr for TimeUnits {
    type Err = OpendapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeUnits::parse(s)
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures;

    #[test]
    fn test_grads_days_since_year_one() {
        let units = TimeUnits::parse("days since 1-1-1 00:00:0.0").unwrap();
        let t = units.decode(fixtures::time::REFERENCE_GRADS_DAYS).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());

        // three-hourly step
        let t = units.decode(738961.125).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 15, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_unix_seconds() {
        let units: TimeUnits = "seconds since 1970-01-01 00:00:00".parse().unwrap();
        let t = units.decode(1710460800.0).unwrap();
        assert_eq!(t.to_rfc3339(), "2024-03-15T00:00:00+00:00");
    }

    #[test]
    fn test_hours_since_1950() {
        let units = TimeUnits::parse("hours since 1950-01-01").unwrap();
        let t = units.decode(0.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0).unwrap());
        let t = units.decode(24.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(1950, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_iso_reference_with_t_and_z() {
        let units = TimeUnits::parse("minutes since 2024-03-15T06:00:00Z").unwrap();
        let t = units.decode(90.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 15, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_invalid_units() {
        assert!(TimeUnits::parse("fortnights since 2024-01-01").is_err());
        assert!(TimeUnits::parse("days").is_err());
        assert!(TimeUnits::parse("days since 2024-02-30").is_err());
    }

    #[test]
    fn test_non_finite_value() {
        let units = TimeUnits::parse("days since 1970-01-01").unwrap();
        assert!(units.decode(f64::NAN).is_err());
    }

    #[test]
    fn test_display_keeps_original_text() {
        let units = TimeUnits::parse("hours since 1950-01-01 00:00:00").unwrap();
        assert_eq!(units.to_string(), "hours since 1950-01-01 00:00:00");
    }
}
