//! Error types for OPeNDAP access.

use marine_common::MarineError;
use thiserror::Error;

pub type OpendapResult<T> = Result<T, OpendapError>;

#[derive(Debug, Error)]
pub enum OpendapError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("{url} rejected the credentials (HTTP {status})")]
    Unauthorized { url: String, status: u16 },

    #[error("Credentials not configured: {0}")]
    MissingCredentials(String),

    #[error("Malformed ASCII response: {0}")]
    Malformed(String),

    #[error("Variable '{0}' missing from response")]
    MissingVariable(String),

    #[error("Unsupported time units '{0}'")]
    InvalidTimeUnits(String),

    #[error("Requested subset is empty: {0}")]
    EmptySubset(String),

    #[error("Cache file error: {0}")]
    Cache(String),
}

impl OpendapError {
    /// Convert into the shared error type, naming the dataset involved.
    pub fn into_marine(self, dataset: &str) -> MarineError {
        match self {
            OpendapError::Unauthorized { .. } | OpendapError::MissingCredentials(_) => {
                MarineError::Authentication {
                    service: dataset.to_string(),
                    message: self.to_string(),
                }
            }
            OpendapError::Malformed(_)
            | OpendapError::MissingVariable(_)
            | OpendapError::InvalidTimeUnits(_) => {
                MarineError::MalformedData(format!("{}: {}", dataset, self))
            }
            OpendapError::EmptySubset(_) => {
                MarineError::DataNotAvailable(format!("{}: {}", dataset, self))
            }
            OpendapError::Cache(_) => MarineError::Io(self.to_string()),
            OpendapError::Request(_) | OpendapError::Http { .. } => {
                MarineError::remote_open(dataset, self)
            }
        }
    }
}
