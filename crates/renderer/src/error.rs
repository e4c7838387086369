//! Rendering errors.

use marine_common::MarineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions {width}x{height} for {len} values")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("palette has {0} entries, at most 256 allowed")]
    PaletteTooLarge(usize),

    #[error("PNG compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("map data serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<RenderError> for MarineError {
    fn from(err: RenderError) -> Self {
        MarineError::RenderError(err.to_string())
    }
}
