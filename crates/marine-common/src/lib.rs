//! Common types and utilities shared across the marine forecast dashboards.

pub mod bbox;
pub mod error;
pub mod location;
pub mod style;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{MarineError, MarineResult};
pub use location::{correct_longitude, Location, LocationTable, LongitudeConvention};
pub use style::Color;
pub use time::{utc_day_bounds, ForecastCycle};
