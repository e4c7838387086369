//! Catalogs of pre-rendered forecast maps.
//!
//! A snapshot directory holds one HTML file per forecast day, written by a
//! separate generation job. Each feed knows how to pull the forecast date
//! out of its filenames; the catalog lists the dated files in chronological
//! order and serves their contents back unmodified.

pub mod catalog;
pub mod error;
pub mod feed;

pub use catalog::{CatalogStatus, SnapshotCatalog, SnapshotEntry};
pub use error::{CatalogError, CatalogResult};
pub use feed::{builtin_feeds, DateExtractor, Feed, FeedConfig};
