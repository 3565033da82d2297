//! Sources of daily sea surface temperature rasters.
//!
//! Everything downstream of this crate consumes the [`SstSource`] trait:
//! one raster per calendar day, subset to a requested bounding box, with
//! days the satellite missed simply absent. Three implementations are
//! provided:
//!
//! * [`ZarrSstSource`] reads a Zarr V3 archive with a leading time
//!   dimension, the operational path.
//! * [`SyntheticSource`] generates a deterministic seasonal field, useful
//!   for smoke-testing a full pipeline without an archive.
//! * [`InMemorySource`] serves rasters handed to it, used by tests.

pub mod error;
pub mod memory;
pub mod source;
pub mod synthetic;
pub mod zarr;

pub(crate) mod window;

pub use error::{Result, SourceError};
pub use memory::InMemorySource;
pub use source::SstSource;
pub use synthetic::SyntheticSource;
pub use zarr::ZarrSstSource;
