//! Dashboard configuration loading and types.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_sampler::SpeedUnit;
use marine_common::{LocationTable, MarineError, MarineResult};
use opendap::{WaveSourceConfig, WindSourceConfig};
use renderer::{default_wave_thresholds, MapView, Threshold, WindColorScale};
use serde::{Deserialize, Serialize};
use snapshot_catalog::{builtin_feeds, FeedConfig};

/// Default location of the YAML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.yaml";

/// Complete dashboard configuration. Every section has defaults, so an
/// empty or partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub wind: WindSourceConfig,
    pub unit: SpeedUnit,
    pub waves: WaveSourceConfig,
    pub overlays: OverlayConfig,
    pub cache: CacheConfig,
    pub snapshots: SnapshotConfig,
    pub map: MapConfig,
    pub links: LinkConfig,
    pub locations: LocationTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub thresholds: Vec<Threshold>,
    /// Alpha of colored overlay cells, 0-255.
    pub fill_alpha: u8,
    /// Leaflet opacity of each overlay image.
    pub opacity: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            thresholds: default_wave_thresholds(),
            fill_alpha: 102,
            opacity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            capacity: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub directory: PathBuf,
    pub feeds: Vec<FeedConfig>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("mapas_html"),
            feeds: builtin_feeds(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MapConfig {
    pub view: MapView,
    pub wind_scale: WindColorScale,
}

/// External pages linked from the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub satellite: String,
    pub fluvial: String,
    pub maritime: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            satellite: "https://zoom.earth/maps/satellite/#view=-35.5,-61.3,4z".to_string(),
            fluvial: "/snapshots/viento-00z".to_string(),
            maritime: "/snapshots/combinado".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to load config: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            locations = config.locations.len(),
            feeds = config.snapshots.feeds.len(),
            "Loaded dashboard config"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MarineResult<()> {
        let invalid = |msg: &str| Err(MarineError::InvalidConfig(msg.to_string()));

        if self.locations.is_empty() {
            return invalid("at least one location is required");
        }
        if self.overlays.thresholds.is_empty() {
            return invalid("overlays.thresholds must not be empty");
        }
        if self.overlays.thresholds.iter().any(|t| !t.value.is_finite()) {
            return invalid("overlay thresholds must be finite");
        }
        if !(0.0..=1.0).contains(&self.overlays.opacity) {
            return invalid("overlays.opacity must be within [0, 1]");
        }
        if self.cache.ttl_secs == 0 {
            return invalid("cache.ttl_secs must be greater than zero");
        }
        if self.cache.capacity == 0 {
            return invalid("cache.capacity must be greater than zero");
        }
        if self.wind.forecast_hours.is_empty() {
            return invalid("wind.forecast_hours must not be empty");
        }
        if self.map.wind_scale.moderate > self.map.wind_scale.strong {
            return invalid("map.wind_scale.moderate must not exceed strong");
        }

        let mut names = HashSet::new();
        for feed in &self.snapshots.feeds {
            if !names.insert(feed.name.as_str()) {
                return Err(MarineError::InvalidConfig(format!(
                    "duplicate snapshot feed '{}'",
                    feed.name
                )));
            }
            feed.build()?;
        }
        Ok(())
    }
}
