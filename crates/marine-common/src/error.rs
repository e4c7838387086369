//! Error types for the marine forecast dashboards.

use thiserror::Error;

/// Result type alias using MarineError.
pub type MarineResult<T> = Result<T, MarineError>;

/// Primary error type shared by the dashboard crates.
///
/// Each variant corresponds to the smallest unit a failure is contained to:
/// one dataset, one snapshot file, one configuration value.
#[derive(Debug, Error)]
pub enum MarineError {
    // === Remote dataset errors ===
    #[error("Could not open remote dataset {dataset}: {message}")]
    RemoteOpen { dataset: String, message: String },

    #[error("Authentication failed for {service}: {message}")]
    Authentication { service: String, message: String },

    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    #[error("Malformed dataset response: {0}")]
    MalformedData(String),

    // === Snapshot catalog errors ===
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Unknown snapshot feed: {0}")]
    UnknownFeed(String),

    // === Configuration errors ===
    #[error("Invalid location '{name}': {message}")]
    InvalidLocation { name: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Rendering errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    // === Infrastructure errors ===
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl MarineError {
    /// Build a remote-open error for the named dataset.
    pub fn remote_open(dataset: impl Into<String>, message: impl ToString) -> Self {
        MarineError::RemoteOpen {
            dataset: dataset.into(),
            message: message.to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MarineError::InvalidParameter { .. } => 400,

            MarineError::SnapshotNotFound(_)
            | MarineError::UnknownFeed(_)
            | MarineError::DataNotAvailable(_) => 404,

            MarineError::RemoteOpen { .. }
            | MarineError::Authentication { .. }
            | MarineError::MalformedData(_) => 502,

            _ => 500,
        }
    }

    /// Whether the error only affects the wave layer of the live dashboard.
    pub fn is_authentication(&self) -> bool {
        matches!(self, MarineError::Authentication { .. })
    }
}

impl From<std::io::Error> for MarineError {
    fn from(err: std::io::Error) -> Self {
        MarineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MarineError {
    fn from(err: serde_json::Error) -> Self {
        MarineError::InternalError(format!("JSON error: {}", err))
    }
}
