//! Common types shared across the reef heat-stress pipeline crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod raster;
pub mod series;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{ReefError, ReefResult};
pub use grid::Grid;
pub use raster::Raster;
pub use series::{GridSeries, TimestampedRaster};
pub use time::{DateRange, MAX_DAY_OF_YEAR};
