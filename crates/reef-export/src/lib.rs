//! Persistence for heat-stress products and climatology baselines.
//!
//! Every product raster (SST, anomaly, HotSpot, DHW) is exported as one
//! Zarr V3 array per day at `{product}/{year}/{YYYYMMDD}`, f32 with NaN as
//! the no-data fill, blosc-zstd compressed. The climatology baseline is
//! stored once as three band-stacked arrays under `baseline/`.
//!
//! The same sink code serves two backends:
//!
//! - **Filesystem**: a local directory via `zarrs_filesystem`
//! - **S3-compatible**: AWS or MinIO via `object_store`, adapted to the
//!   synchronous zarrs API in [`s3`]
//!
//! # Example
//!
//! ```ignore
//! use reef_export::{ExportConfig, ExportSink, ZarrExportSink};
//!
//! let sink = ZarrExportSink::filesystem("/data/reef", ExportConfig::default())?;
//! sink.persist_raster("dhw", date, &dhw).await?;
//!
//! // A later run can reload what was written.
//! let stored = sink.load_raster("dhw", date).await?;
//! ```

pub mod baseline;
pub mod config;
pub mod error;
pub mod layout;
pub mod s3;
pub mod sink;
pub mod zarr_sink;

// Re-export commonly used types at crate root
pub use baseline::BaselineStore;
pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use sink::{ExportMetadata, ExportSink, InMemorySink};
pub use zarr_sink::ZarrExportSink;
