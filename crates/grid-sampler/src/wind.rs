//! Wind vector conversion.
//!
//! Converts eastward (U) and northward (V) wind components to speed and the
//! meteorological direction the wind blows FROM (0° = N, 90° = E, clockwise).

use serde::{Deserialize, Serialize};

/// Meters per second to knots.
pub const MS_TO_KNOTS: f64 = 1.94384;

/// Display unit for wind speed. Source components are always m/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    #[default]
    Knots,
    MetersPerSecond,
    KilometersPerHour,
}

impl SpeedUnit {
    /// Multiplicative factor from m/s.
    pub fn factor(self) -> f64 {
        match self {
            SpeedUnit::Knots => MS_TO_KNOTS,
            SpeedUnit::MetersPerSecond => 1.0,
            SpeedUnit::KilometersPerHour => 3.6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            SpeedUnit::Knots => "kt",
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
        }
    }
}

/// Wind speed in the chosen unit and direction in degrees [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindPolar {
    pub speed: f64,
    pub direction: f64,
}

/// Direction the wind blows FROM, in degrees [0, 360).
///
/// `(270 - atan2(v, u)) mod 360`. Pure +U (westerly) gives 270°, pure -V
/// (northerly) gives 0°.
pub fn direction_from(u: f64, v: f64) -> f64 {
    let direction = (270.0 - v.atan2(u).to_degrees()).rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if direction >= 360.0 {
        0.0
    } else {
        direction
    }
}

/// Convert U/V components (m/s) to speed in `unit` and direction FROM.
pub fn uv_to_polar(u: f64, v: f64, unit: SpeedUnit) -> WindPolar {
    WindPolar {
        speed: u.hypot(v) * unit.factor(),
        direction: direction_from(u, v),
    }
}
