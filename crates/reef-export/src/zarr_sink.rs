//! Zarr V3 export sink.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::storage::{ReadableStorageTraits, WritableStorageTraits};
use zarrs_filesystem::FilesystemStore;

use reef_common::{BoundingBox, Grid, Raster};

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::layout;
use crate::sink::{ExportMetadata, ExportSink};

/// Build the blosc zstd codec used for every exported array.
pub(crate) fn blosc_codec(
    level: u8,
) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
    let level = BloscCompressionLevel::try_from(level)
        .map_err(|_| ExportError::Config(format!("invalid compression level {level}")))?;

    // typesize 4 for f32; required when shuffle is enabled
    let codec = BloscCodec::new(
        BloscCompressor::Zstd,
        level,
        None,
        BloscShuffleMode::Shuffle,
        Some(4),
    )
    .map_err(|e| ExportError::Config(e.to_string()))?;

    Ok(Arc::new(codec))
}

/// Create a NaN-filled f32 array and write `data` into it whole.
pub(crate) fn write_f32_array<S>(
    store: Arc<S>,
    path: &str,
    shape: Vec<u64>,
    chunk: Vec<u64>,
    attrs: serde_json::Map<String, serde_json::Value>,
    data: &[f32],
    compression_level: u8,
) -> Result<()>
where
    S: ReadableStorageTraits + WritableStorageTraits + 'static,
{
    let chunk_grid: zarrs::array::ChunkGrid = chunk
        .try_into()
        .map_err(|e| ExportError::Config(format!("{:?}", e)))?;

    let mut binding = ArrayBuilder::new(
        shape.clone(),
        DataType::Float32,
        chunk_grid,
        FillValue::from(f32::NAN),
    );
    let mut builder = binding.attributes(attrs);
    builder = builder.bytes_to_bytes_codecs(vec![blosc_codec(compression_level)?]);

    let array = builder
        .build(store, path)
        .map_err(|e| ExportError::write_failed(e.to_string()))?;
    array
        .store_metadata()
        .map_err(|e| ExportError::write_failed(e.to_string()))?;

    let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape)
        .map_err(|e| ExportError::write_failed(e.to_string()))?;
    array
        .store_array_subset_elements(&subset, data)
        .map_err(|e| ExportError::write_failed(e.to_string()))?;

    Ok(())
}

/// Read an f32 array whole, decoding its fill value to NaN.
pub(crate) fn read_f32_array<S>(
    store: Arc<S>,
    path: &str,
) -> Result<(
    Vec<u64>,
    serde_json::Map<String, serde_json::Value>,
    Vec<f32>,
)>
where
    S: ReadableStorageTraits + 'static,
{
    let array =
        Array::open(store, path).map_err(|e| ExportError::open_failed(e.to_string()))?;
    let shape = array.shape().to_vec();
    let attrs = array.attributes().clone();

    let fill = array
        .fill_value()
        .as_ne_bytes()
        .try_into()
        .map(f32::from_ne_bytes)
        .unwrap_or(f32::NAN);

    let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape.clone())
        .map_err(|e| ExportError::read_failed(e.to_string()))?;
    let mut data: Vec<f32> = array
        .retrieve_array_subset_elements(&subset)
        .map_err(|e| ExportError::read_failed(e.to_string()))?;

    for v in &mut data {
        if !v.is_finite() || (fill.is_finite() && *v == fill) {
            *v = f32::NAN;
        }
    }

    Ok((shape, attrs, data))
}

/// An [`ExportSink`] writing one Zarr V3 array per product per day.
///
/// Arrays are `[rows, cols]` f32, NaN-filled, blosc-zstd compressed, with
/// an [`ExportMetadata`] record in the attributes. Paths follow
/// [`layout::raster_path`].
pub struct ZarrExportSink<S> {
    store: Arc<S>,
    prefix: String,
    config: ExportConfig,
}

impl<S: ReadableStorageTraits + WritableStorageTraits + Send + Sync + 'static> ZarrExportSink<S> {
    pub fn new(store: Arc<S>, config: ExportConfig) -> Self {
        Self {
            store,
            prefix: String::new(),
            config,
        }
    }

    /// Place the dataset under a path inside the store.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        while prefix.ends_with('/') {
            prefix.pop();
        }
        self.prefix = prefix;
        self
    }

    fn path_for(&self, product: &str, date: NaiveDate) -> String {
        layout::raster_path(&self.prefix, product, date)
    }
}

impl ZarrExportSink<FilesystemStore> {
    /// Sink rooted in a local directory, created if absent.
    pub fn filesystem(root: impl AsRef<Path>, config: ExportConfig) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())
            .map_err(|e| ExportError::Config(format!("creating {}: {e}", root.as_ref().display())))?;
        let store = FilesystemStore::new(root.as_ref())
            .map_err(|e| ExportError::Config(e.to_string()))?;
        Ok(Self::new(Arc::new(store), config))
    }
}

#[async_trait]
impl<S: ReadableStorageTraits + WritableStorageTraits + Send + Sync + 'static> ExportSink
    for ZarrExportSink<S>
{
    async fn persist_raster(&self, product: &str, date: NaiveDate, raster: &Raster) -> Result<()> {
        let path = self.path_for(product, date);
        let grid = raster.grid();
        let attrs = ExportMetadata::daily(product, date, grid).to_attrs();

        let shape = vec![grid.height as u64, grid.width as u64];
        let chunk = vec![
            self.config.chunk_size as u64,
            self.config.chunk_size as u64,
        ];

        write_f32_array(
            self.store.clone(),
            &path,
            shape,
            chunk,
            attrs,
            &raster.nan_encoded(),
            self.config.compression_level,
        )?;

        debug!(product, %date, %path, "persisted raster");
        Ok(())
    }

    async fn persist_bands(
        &self,
        name: &str,
        meta: &ExportMetadata,
        bands: &[Raster],
    ) -> Result<()> {
        let first = bands.first().ok_or_else(|| {
            ExportError::invalid_metadata(format!("no bands to persist for {name}"))
        })?;
        for band in bands {
            first.check_same_grid(band)?;
        }
        let grid = first.grid();

        let path = layout::flat_path(&self.prefix, name);
        let shape = vec![bands.len() as u64, grid.height as u64, grid.width as u64];
        let chunk = vec![
            1,
            self.config.chunk_size as u64,
            self.config.chunk_size as u64,
        ];

        let mut data = Vec::with_capacity(bands.len() * grid.len());
        for band in bands {
            data.extend(band.nan_encoded());
        }

        write_f32_array(
            self.store.clone(),
            &path,
            shape,
            chunk,
            meta.to_attrs(),
            &data,
            self.config.compression_level,
        )?;

        debug!(dataset = name, bands = bands.len(), %path, "persisted band stack");
        Ok(())
    }

    /// An array that fails to open counts as absent.
    async fn exists(&self, product: &str, date: NaiveDate) -> Result<bool> {
        let path = self.path_for(product, date);
        Ok(Array::open(self.store.clone(), &path).is_ok())
    }

    async fn load_raster(&self, product: &str, date: NaiveDate) -> Result<Option<Raster>> {
        let path = self.path_for(product, date);
        let (shape, attrs, data) = match read_f32_array(self.store.clone(), &path) {
            Ok(parts) => parts,
            Err(ExportError::OpenFailed(reason)) => {
                debug!(product, %date, %reason, "no stored raster");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if shape.len() != 2 {
            return Err(ExportError::invalid_metadata(format!(
                "expected a [rows, cols] array at {path}, got {} dimensions",
                shape.len()
            )));
        }

        let meta = ExportMetadata::from_attrs(&attrs)?;
        let bbox = BoundingBox::new(meta.bbox[0], meta.bbox[1], meta.bbox[2], meta.bbox[3]);
        let grid = Grid::new(bbox, shape[1] as usize, shape[0] as usize);

        Ok(Some(Raster::from_nan_values(grid, data)?))
    }

    async fn load_bands(&self, name: &str) -> Result<Option<(ExportMetadata, Vec<Raster>)>> {
        let path = layout::flat_path(&self.prefix, name);
        let (shape, attrs, data) = match read_f32_array(self.store.clone(), &path) {
            Ok(parts) => parts,
            Err(ExportError::OpenFailed(reason)) => {
                debug!(dataset = name, %reason, "no stored band stack");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if shape.len() != 3 {
            return Err(ExportError::invalid_metadata(format!(
                "expected a [bands, rows, cols] array at {path}, got {} dimensions",
                shape.len()
            )));
        }

        let meta = ExportMetadata::from_attrs(&attrs)?;
        let bbox = BoundingBox::new(meta.bbox[0], meta.bbox[1], meta.bbox[2], meta.bbox[3]);
        let grid = Grid::new(bbox, shape[2] as usize, shape[1] as usize);

        let bands = data
            .chunks_exact(grid.len())
            .map(|band| Ok(Raster::from_nan_values(grid, band.to_vec())?))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some((meta, bands)))
    }
}

#[cfg(test)]
mod tests {
    use test_utils::{assert_raster_approx_eq, date, small_grid};

    use super::*;

    fn sink_in(dir: &Path) -> ZarrExportSink<FilesystemStore> {
        ZarrExportSink::filesystem(dir, ExportConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_persist_and_reload_raster() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());

        let mut raster = Raster::filled(small_grid(), 16.8);
        raster.set(3, 0.0);
        raster.clear(7);

        sink.persist_raster("dhw", date(2024, 3, 15), &raster)
            .await
            .unwrap();

        let loaded = sink
            .load_raster("dhw", date(2024, 3, 15))
            .await
            .unwrap()
            .expect("raster was persisted");

        assert_eq!(loaded.grid(), raster.grid());
        assert_raster_approx_eq!(loaded, raster, 1e-6);
        // The cleared cell survives the NaN boundary.
        assert_eq!(loaded.get(7), None);
        assert_eq!(loaded.get(3), Some(0.0));
    }

    #[tokio::test]
    async fn test_exists_and_absent_load() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());
        let raster = Raster::filled(small_grid(), 1.0);

        sink.persist_raster("hotspot", date(2024, 1, 2), &raster)
            .await
            .unwrap();

        assert!(sink.exists("hotspot", date(2024, 1, 2)).await.unwrap());
        assert!(!sink.exists("hotspot", date(2024, 1, 3)).await.unwrap());
        assert!(!sink.exists("dhw", date(2024, 1, 2)).await.unwrap());

        let absent = sink.load_raster("dhw", date(2024, 1, 2)).await.unwrap();
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn test_persist_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());

        sink.persist_raster("sst", date(2024, 1, 1), &Raster::filled(small_grid(), 1.0))
            .await
            .unwrap();
        sink.persist_raster("sst", date(2024, 1, 1), &Raster::filled(small_grid(), 2.0))
            .await
            .unwrap();

        let loaded = sink
            .load_raster("sst", date(2024, 1, 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.get(0), Some(2.0));
    }

    #[tokio::test]
    async fn test_prefix_moves_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ZarrExportSink::filesystem(dir.path(), ExportConfig::default())
            .unwrap()
            .with_prefix("/reef/");
        let raster = Raster::filled(small_grid(), 1.0);

        sink.persist_raster("dhw", date(2024, 3, 1), &raster)
            .await
            .unwrap();

        assert!(dir.path().join("reef/dhw/2024/20240301/zarr.json").is_file());
        assert_eq!(
            layout::filesystem_inventory(&dir.path().join("reef"), "dhw").unwrap(),
            vec![date(2024, 3, 1)]
        );
    }

    #[tokio::test]
    async fn test_band_stack_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());
        let grid = small_grid();

        let bands: Vec<_> = (0..12)
            .map(|m| {
                let mut raster = Raster::filled(grid, 20.0 + m as f32 * 0.1);
                raster.clear(5);
                raster
            })
            .collect();
        let meta = ExportMetadata::bands("monthly_mean", "Monthly mean SST", &grid)
            .with_window(1985, 2012, 1988.2857);

        sink.persist_bands("baseline/monthly_mean", &meta, &bands)
            .await
            .unwrap();

        let (loaded_meta, loaded) = sink
            .load_bands("baseline/monthly_mean")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded_meta.baseline_start, Some(1985));
        assert_eq!(loaded.len(), 12);
        assert_raster_approx_eq!(loaded[11], bands[11], 1e-6);
        assert_eq!(loaded[3].get(5), None);

        assert!(sink.load_bands("baseline/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inventory_after_backfill() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());
        let raster = Raster::filled(small_grid(), 1.0);

        for day in [date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)] {
            sink.persist_raster("dhw", day, &raster).await.unwrap();
        }

        let dates = layout::filesystem_inventory(dir.path(), "dhw").unwrap();
        assert_eq!(
            dates,
            vec![date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
        );
    }
}
