//! Error types for product export and reload.

use thiserror::Error;

/// Errors that can occur while persisting or reloading products.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to open a stored array.
    #[error("failed to open stored array: {0}")]
    OpenFailed(String),

    /// Failed to write an array.
    #[error("failed to write array: {0}")]
    WriteFailed(String),

    /// Failed to read a stored array.
    #[error("failed to read stored array: {0}")]
    ReadFailed(String),

    /// Invalid metadata on a stored array.
    #[error("invalid stored metadata: {0}")]
    InvalidMetadata(String),

    /// Storage backend configuration error.
    #[error("storage configuration error: {0}")]
    Config(String),

    /// Grid or series consistency error.
    #[error("grid error: {0}")]
    Grid(#[from] reef_common::ReefError),
}

impl ExportError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a WriteFailed error.
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::ReadFailed(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
