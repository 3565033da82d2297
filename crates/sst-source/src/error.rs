//! Error types for SST sources.

use thiserror::Error;

/// Errors that can occur while reading an SST archive.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Failed to open the archive.
    #[error("failed to open SST archive: {0}")]
    OpenFailed(String),

    /// Failed to read data from the archive.
    #[error("failed to read SST data: {0}")]
    ReadFailed(String),

    /// Invalid metadata in the archive.
    #[error("invalid archive metadata: {0}")]
    InvalidMetadata(String),

    /// The requested region does not intersect the archive's grid.
    #[error("requested region {requested} does not intersect archive bounds {bounds}")]
    OutOfBounds { requested: String, bounds: String },

    /// Grid or series consistency error.
    #[error("grid error: {0}")]
    Grid(#[from] reef_common::ReefError),
}

impl SourceError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create an OutOfBounds error.
    pub fn out_of_bounds(requested: impl Into<String>, bounds: impl Into<String>) -> Self {
        Self::OutOfBounds {
            requested: requested.into(),
            bounds: bounds.into(),
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        Self::ReadFailed(err.to_string())
    }
}

/// Result type for SST source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
