//! Application state for the dashboard service.

use std::sync::Arc;

use marine_common::{MarineError, MarineResult};
use snapshot_catalog::{Feed, SnapshotCatalog};

use crate::config::DashboardConfig;
use crate::forecast::ForecastService;
use crate::source::{ForecastSource, OpendapSource};

/// Shared application state.
pub struct AppState {
    pub config: DashboardConfig,
    pub forecast: ForecastService,
    /// Compiled snapshot feeds, in configuration order.
    pub feeds: Vec<Feed>,
}

impl AppState {
    /// Build state around an arbitrary forecast source.
    pub fn new(config: DashboardConfig, source: Arc<dyn ForecastSource>) -> MarineResult<Self> {
        config.validate()?;
        let feeds = config
            .snapshots
            .feeds
            .iter()
            .map(|f| f.build().map_err(MarineError::from))
            .collect::<MarineResult<Vec<_>>>()?;
        let forecast = ForecastService::new(&config, source);
        Ok(Self {
            config,
            forecast,
            feeds,
        })
    }

    /// State backed by the remote OPeNDAP datasets.
    pub fn from_config(config: DashboardConfig) -> MarineResult<Self> {
        let source = OpendapSource::new(config.wind.clone(), config.waves.clone())?;
        Self::new(config, Arc::new(source))
    }

    pub fn feed(&self, name: &str) -> MarineResult<&Feed> {
        self.feeds
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| MarineError::UnknownFeed(name.to_string()))
    }

    /// Fresh listing of the snapshot directory for `feed`.
    pub fn catalog(&self, feed: &Feed) -> MarineResult<SnapshotCatalog> {
        Ok(SnapshotCatalog::scan(
            &self.config.snapshots.directory,
            &feed.extractor,
        )?)
    }
}
