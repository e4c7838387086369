//! Catalog errors.

use std::path::PathBuf;

use marine_common::MarineError;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid filename pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("filename pattern '{0}' has no `date` capture group")]
    MissingDateGroup(String),

    #[error("'{0}' is not in the catalog")]
    NotInCatalog(String),

    #[error("failed to read {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<CatalogError> for MarineError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotInCatalog(name) => MarineError::SnapshotNotFound(name),
            CatalogError::Io { .. } => MarineError::Io(err.to_string()),
            CatalogError::InvalidPattern { .. } | CatalogError::MissingDateGroup(_) => {
                MarineError::InvalidConfig(err.to_string())
            }
        }
    }
}
