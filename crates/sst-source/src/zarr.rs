//! SST source over a Zarr V3 archive with a leading time dimension.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs::storage::ReadableStorageTraits;
use zarrs_filesystem::FilesystemStore;

use reef_common::{BoundingBox, DateRange, Grid, GridSeries, Raster};

use crate::error::{Result, SourceError};
use crate::source::SstSource;
use crate::window::{window_for_bbox, CellWindow};

/// An [`SstSource`] reading a Zarr V3 array shaped `[time, rows, cols]`.
///
/// The archive carries one slice per calendar day with no gaps in the time
/// axis; a day the satellite missed is an all-fill slice. Metadata lives in
/// the array attributes:
///
/// * `variable` - name of the stored variable (defaults to `sst`)
/// * `start_date` - calendar date of time index 0, `YYYY-MM-DD`
/// * `bbox` - `[min_lon, min_lat, max_lon, max_lat]` of the full grid
/// * `scale_factor` - multiplier applied to stored values (defaults to 1,
///   OISST-style archives store hundredths of a degree with 0.01 here)
pub struct ZarrSstSource<S: ReadableStorageTraits + 'static> {
    array: Array<S>,
    variable: String,
    start_date: NaiveDate,
    num_days: u64,
    grid: Grid,
    scale_factor: f32,
    fill_value: f32,
}

impl<S: ReadableStorageTraits + Send + Sync + 'static> ZarrSstSource<S> {
    /// Open an archive from storage.
    pub fn open(storage: S, path: &str) -> Result<Self> {
        let array = Array::open(Arc::new(storage), path)
            .map_err(|e| SourceError::open_failed(e.to_string()))?;

        let shape = array.shape().to_vec();
        if shape.len() != 3 {
            return Err(SourceError::invalid_metadata(format!(
                "expected a [time, rows, cols] array, got {} dimensions",
                shape.len()
            )));
        }

        let attrs = array.attributes();

        let variable = attrs
            .get("variable")
            .and_then(|v| v.as_str())
            .unwrap_or("sst")
            .to_string();

        let start_date = attrs
            .get("start_date")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SourceError::invalid_metadata("missing start_date attribute"))?;
        let start_date = NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
            .map_err(|e| SourceError::invalid_metadata(format!("bad start_date: {e}")))?;

        let bbox = attrs
            .get("bbox")
            .and_then(|v| v.as_array())
            .and_then(|arr| {
                if arr.len() == 4 {
                    Some(BoundingBox::new(
                        arr[0].as_f64()?,
                        arr[1].as_f64()?,
                        arr[2].as_f64()?,
                        arr[3].as_f64()?,
                    ))
                } else {
                    None
                }
            })
            .ok_or_else(|| SourceError::invalid_metadata("missing or malformed bbox attribute"))?;

        let scale_factor = attrs
            .get("scale_factor")
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0) as f32;

        let fill_value = array
            .fill_value()
            .as_ne_bytes()
            .try_into()
            .map(f32::from_ne_bytes)
            .unwrap_or(f32::NAN);

        let grid = Grid::new(bbox, shape[2] as usize, shape[1] as usize);

        Ok(Self {
            array,
            variable,
            start_date,
            num_days: shape[0],
            grid,
            scale_factor,
            fill_value,
        })
    }

    /// The archive's full grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// First date of the time axis.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Time index of a date, `None` outside the archive's span.
    fn time_index(&self, date: NaiveDate) -> Option<u64> {
        let offset = date.signed_duration_since(self.start_date).num_days();
        if offset < 0 || offset as u64 >= self.num_days {
            None
        } else {
            Some(offset as u64)
        }
    }

    /// Read one day's window and decode fill values to no-data.
    fn read_day(&self, t: u64, window: &CellWindow) -> Result<Raster> {
        let subset = ArraySubset::new_with_start_shape(
            vec![t, window.start_row as u64, window.start_col as u64],
            vec![1, window.grid.height as u64, window.grid.width as u64],
        )
        .map_err(|e| SourceError::read_failed(e.to_string()))?;

        let raw: Vec<f32> = self
            .array
            .retrieve_array_subset_elements(&subset)
            .map_err(|e| SourceError::read_failed(e.to_string()))?;

        let fill = self.fill_value;
        let scale = self.scale_factor;
        let values: Vec<f32> = raw
            .into_iter()
            .map(|v| {
                if !v.is_finite() || (fill.is_finite() && v == fill) {
                    f32::NAN
                } else {
                    v * scale
                }
            })
            .collect();

        Ok(Raster::from_nan_values(window.grid, values)?)
    }
}

impl ZarrSstSource<FilesystemStore> {
    /// Open an archive rooted in a local directory.
    pub fn open_filesystem(root: impl AsRef<Path>, path: &str) -> Result<Self> {
        let store = FilesystemStore::new(root.as_ref())
            .map_err(|e| SourceError::open_failed(e.to_string()))?;
        Self::open(store, path)
    }
}

#[async_trait]
impl<S: ReadableStorageTraits + Send + Sync + 'static> SstSource for ZarrSstSource<S> {
    fn variable(&self) -> &str {
        &self.variable
    }

    async fn fetch(&self, bbox: &BoundingBox, range: DateRange) -> Result<GridSeries> {
        let window = window_for_bbox(&self.grid, bbox).ok_or_else(|| {
            SourceError::out_of_bounds(format!("{:?}", bbox), format!("{:?}", self.grid.bbox))
        })?;

        let mut series = GridSeries::new(self.variable.clone(), window.grid);
        for date in range.iter() {
            let t = match self.time_index(date) {
                Some(t) => t,
                None => continue,
            };

            let raster = self.read_day(t, &window)?;
            if raster.valid_count() == 0 {
                // An all-fill slice is a day the satellite missed.
                debug!(%date, "skipping all-fill day");
                continue;
            }
            series.insert(date, raster)?;
        }

        debug!(
            variable = %self.variable,
            days = series.len(),
            start = %range.start,
            end = %range.end,
            "fetched SST series"
        );
        Ok(series)
    }

    async fn has_data(&self, date: NaiveDate) -> Result<bool> {
        let t = match self.time_index(date) {
            Some(t) => t,
            None => return Ok(false),
        };

        let window = CellWindow {
            start_col: 0,
            start_row: 0,
            grid: self.grid,
        };
        let raster = self.read_day(t, &window)?;
        Ok(raster.valid_count() > 0)
    }
}

#[cfg(test)]
mod tests {
    use zarrs::array::{ArrayBuilder, DataType, FillValue};

    use test_utils::{assert_approx_eq, date};

    use super::*;

    const FILL: f32 = -9999.0;

    /// Write a [3, 2, 4] archive: March 1-3 2024, 0.25 degree cells over
    /// (140, -12) to (141, -11.5), values in hundredths of a degree.
    /// Day 2 is an all-fill slice.
    fn write_archive(root: &Path) {
        let store = Arc::new(FilesystemStore::new(root).unwrap());

        let mut attrs = serde_json::Map::new();
        attrs.insert("variable".to_string(), serde_json::json!("sst"));
        attrs.insert("start_date".to_string(), serde_json::json!("2024-03-01"));
        attrs.insert(
            "bbox".to_string(),
            serde_json::json!([140.0, -12.0, 141.0, -11.5]),
        );
        attrs.insert("scale_factor".to_string(), serde_json::json!(0.01));

        let chunk_grid: zarrs::array::ChunkGrid = vec![1, 2, 4].try_into().unwrap();
        let mut binding = ArrayBuilder::new(
            vec![3, 2, 4],
            DataType::Float32,
            chunk_grid,
            FillValue::from(FILL),
        );
        let array = binding.attributes(attrs).build(store, "/sst").unwrap();
        array.store_metadata().unwrap();

        let mut data = vec![FILL; 3 * 2 * 4];
        for (idx, slot) in data.iter_mut().take(8).enumerate() {
            *slot = 2500.0 + idx as f32;
        }
        // One cloud-masked cell on day one.
        data[5] = FILL;
        for (idx, slot) in data.iter_mut().skip(16).enumerate() {
            *slot = 2600.0 + idx as f32;
        }

        let subset = ArraySubset::new_with_start_shape(vec![0, 0, 0], vec![3, 2, 4]).unwrap();
        array.store_array_subset_elements(&subset, &data).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_scales_and_masks_fill() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path());

        let source = ZarrSstSource::open_filesystem(dir.path(), "/sst").unwrap();
        assert_eq!(source.variable(), "sst");
        assert_eq!(source.grid().width, 4);
        assert_eq!(source.grid().height, 2);

        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 3)).unwrap();
        let series = source.fetch(&source.grid().bbox, range).await.unwrap();

        // Day two is all fill and treated as missing.
        assert_eq!(series.len(), 2);
        assert!(series.get(date(2024, 3, 2)).is_none());

        let day_one = series.get(date(2024, 3, 1)).unwrap();
        assert_approx_eq!(day_one.get(0).unwrap(), 25.0, 1e-4);
        assert_eq!(day_one.get(5), None);

        let day_three = series.get(date(2024, 3, 3)).unwrap();
        assert_approx_eq!(day_three.get(0).unwrap(), 26.0, 1e-4);
    }

    #[tokio::test]
    async fn test_fetch_subsets_by_bbox() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path());

        let source = ZarrSstSource::open_filesystem(dir.path(), "/sst").unwrap();

        // Eastern half of the southern row: cols 2-3, row 1.
        let request = BoundingBox::new(140.5, -12.0, 141.0, -11.75);
        let series = source
            .fetch(&request, DateRange::single(date(2024, 3, 1)))
            .await
            .unwrap();

        let raster = series.get(date(2024, 3, 1)).unwrap();
        assert_eq!(raster.grid().width, 2);
        assert_eq!(raster.grid().height, 1);
        // Source cells 6 and 7, in hundredths.
        assert_approx_eq!(raster.get(0).unwrap(), 25.06, 1e-4);
        assert_approx_eq!(raster.get(1).unwrap(), 25.07, 1e-4);
    }

    #[tokio::test]
    async fn test_has_data_probes_the_slice() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path());

        let source = ZarrSstSource::open_filesystem(dir.path(), "/sst").unwrap();

        assert!(source.has_data(date(2024, 3, 1)).await.unwrap());
        assert!(!source.has_data(date(2024, 3, 2)).await.unwrap());
        // Outside the time axis entirely.
        assert!(!source.has_data(date(2024, 2, 29)).await.unwrap());
        assert!(!source.has_data(date(2024, 3, 4)).await.unwrap());
    }

    #[test]
    fn test_open_rejects_wrong_dimensionality() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());

        let chunk_grid: zarrs::array::ChunkGrid = vec![2, 4].try_into().unwrap();
        let mut binding = ArrayBuilder::new(
            vec![2, 4],
            DataType::Float32,
            chunk_grid,
            FillValue::from(f32::NAN),
        );
        let array = binding.build(store, "/flat").unwrap();
        array.store_metadata().unwrap();

        let result = ZarrSstSource::open_filesystem(dir.path(), "/flat");
        assert!(matches!(result, Err(SourceError::InvalidMetadata(_))));
    }
}
