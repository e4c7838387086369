//! Map rendering for the marine dashboards.
//!
//! - [`overlay`]: threshold masks of scalar fields as translucent PNG layers
//! - [`png`]: indexed PNG encoding
//! - [`map`]: Leaflet map documents with wind markers and overlays

pub mod error;
pub mod map;
pub mod overlay;
pub mod png;

pub use error::RenderError;
pub use map::{MapDocument, MapView, WindColorScale, WindMarker, LEAFLET_HEAD};
pub use overlay::{
    build_threshold_overlays, daily_max, default_wave_thresholds, OverlayLayer, Threshold,
};
