//! The source abstraction over daily SST archives.

use async_trait::async_trait;
use chrono::NaiveDate;

use reef_common::{BoundingBox, DateRange, GridSeries};

use crate::error::Result;

/// A provider of daily SST rasters for one variable.
///
/// Implementations subset their native grid to the requested bounding box
/// and return one raster per covered day. A day the archive does not cover
/// is absent from the series, not an error; downstream accumulation treats
/// absence as missing coverage.
#[async_trait]
pub trait SstSource: Send + Sync {
    /// Name of the variable this source serves.
    fn variable(&self) -> &str;

    /// Fetch daily rasters for `range`, subset to `bbox`.
    async fn fetch(&self, bbox: &BoundingBox, range: DateRange) -> Result<GridSeries>;

    /// Whether the archive holds any data for `date`.
    async fn has_data(&self, date: NaiveDate) -> Result<bool>;
}
