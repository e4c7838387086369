//! Nearest-neighbor sampling of gridded forecast fields.
//!
//! - [`field`] holds read-only (time, lat, lon) grids and the axis lookups.
//! - [`wind`] converts U/V components to speed and meteorological direction.
//! - [`sampler`] turns a wind field plus a location table into a
//!   [`SampleReport`] of per-location forecasts.

pub mod field;
pub mod sampler;
pub mod wind;

pub use field::{nearest_index, Axis, AxisLookupError, GriddedField, ScalarGrid, VectorField};
pub use sampler::{
    ForecastSample, GridSampler, SampleOutcome, SampleReport, SkipReason, SkippedSample,
};
pub use wind::{direction_from, uv_to_polar, SpeedUnit, WindPolar, MS_TO_KNOTS};
