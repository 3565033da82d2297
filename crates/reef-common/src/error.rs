//! Error types shared by the pipeline crates.

use chrono::NaiveDate;
use thiserror::Error;

use crate::Grid;

/// Result type alias using ReefError.
pub type ReefResult<T> = Result<T, ReefError>;

/// Structural errors raised by the analysis engine.
///
/// Cell-level data conditions (a thin regression sample, a gap inside a DHW
/// window) are never errors: they surface as per-cell no-data in the output
/// rasters. The variants here are pipeline wiring bugs or malformed inputs
/// and abort the affected computation.
#[derive(Debug, Error)]
pub enum ReefError {
    /// Two rasters over different grids were combined.
    #[error("Grid mismatch: {left} vs {right}")]
    GridMismatch { left: String, right: String },

    /// A buffer does not match its expected element count (grid cells,
    /// climatology bands, and the like).
    #[error("Shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A series already holds an entry for this date.
    #[error("Duplicate date in series: {0}")]
    DuplicateDate(NaiveDate),

    /// A date range with end before start.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// A date string that does not parse.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl ReefError {
    /// Build a grid mismatch error from the two offending grids.
    pub fn grid_mismatch(left: &Grid, right: &Grid) -> Self {
        ReefError::GridMismatch {
            left: left.describe(),
            right: right.describe(),
        }
    }
}
