//! Export sink trait and metadata record.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use reef_common::{Grid, GridSeries, Raster};

use crate::error::Result;

/// Metadata stored in the attributes of every exported array.
///
/// One flat record covers dailies, band stacks, and the baseline assets;
/// fields that do not apply stay `None` and are omitted from the attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Variable name, e.g. `sst`, `dhw`, `monthly_mean`.
    pub variable: String,
    /// Physical units of the values.
    pub units: String,
    /// Human-readable description.
    pub description: String,
    /// Geographic extent as `[min_lon, min_lat, max_lon, max_lat]`.
    pub bbox: [f64; 4],
    /// Cell size in degrees as `[lon_per_cell, lat_per_cell]`.
    pub resolution: [f64; 2],
    /// Calendar date for daily products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Band labels for band stacks, first band first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_labels: Option<Vec<String>>,
    /// First year of the baseline window, for baseline assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_start: Option<i32>,
    /// Last year of the baseline window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_end: Option<i32>,
    /// Reference year the climatology regression was evaluated at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_year: Option<f64>,
}

impl ExportMetadata {
    /// Metadata for one daily product raster.
    pub fn daily(product: &str, date: NaiveDate, grid: &Grid) -> Self {
        let mut meta = Self::bands(product, description_for(product), grid);
        meta.date = Some(date);
        meta
    }

    /// Metadata for a band stack or flat asset.
    pub fn bands(variable: &str, description: &str, grid: &Grid) -> Self {
        let (res_lon, res_lat) = grid.resolution();
        Self {
            variable: variable.to_string(),
            units: units_for(variable).to_string(),
            description: description.to_string(),
            bbox: [
                grid.bbox.min_lon,
                grid.bbox.min_lat,
                grid.bbox.max_lon,
                grid.bbox.max_lat,
            ],
            resolution: [res_lon, res_lat],
            date: None,
            band_labels: None,
            baseline_start: None,
            baseline_end: None,
            reference_year: None,
        }
    }

    /// Attach band labels, first band first.
    pub fn with_band_labels(mut self, labels: Vec<String>) -> Self {
        self.band_labels = Some(labels);
        self
    }

    /// Record the baseline window the asset was computed from.
    pub fn with_window(mut self, start: i32, end: i32, reference_year: f64) -> Self {
        self.baseline_start = Some(start);
        self.baseline_end = Some(end);
        self.reference_year = Some(reference_year);
        self
    }

    /// Serialize into Zarr array attributes.
    pub fn to_attrs(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    /// Deserialize from Zarr array attributes.
    pub fn from_attrs(attrs: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::Value::Object(
            attrs.clone(),
        ))?)
    }
}

/// Units for a known product variable.
fn units_for(product: &str) -> &'static str {
    match product {
        "dhw" | "dhw_annual_max" => "degC_weeks",
        _ => "degC",
    }
}

/// Description for a known product variable.
fn description_for(product: &str) -> &str {
    match product {
        "sst" => "Sea surface temperature",
        "anomaly" => "SST anomaly relative to the daily climatology",
        "hotspot" => "Coral bleaching HotSpot: SST excess over the maximum monthly mean",
        "dhw" => "Degree heating weeks over the trailing 84-day window",
        "dhw_annual_max" => "Annual maximum of daily degree heating weeks",
        other => other,
    }
}

/// Destination for finished products and baseline assets.
///
/// Daily rasters land under `{product}/{year}/{YYYYMMDD}`; band stacks land
/// under a flat dataset name. Implementations must read back what they
/// wrote: baseline assets are persisted once and reloaded by later runs.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Persist one product raster for one date.
    async fn persist_raster(&self, product: &str, date: NaiveDate, raster: &Raster) -> Result<()>;

    /// Persist a fixed-band stack (12 monthly means, 366 daily baselines)
    /// under a flat dataset name.
    async fn persist_bands(
        &self,
        name: &str,
        meta: &ExportMetadata,
        bands: &[Raster],
    ) -> Result<()>;

    /// Persist a dated series, one raster per day under the daily layout.
    async fn persist_series(&self, product: &str, series: &GridSeries) -> Result<()> {
        for entry in series.iter() {
            self.persist_raster(product, entry.date, &entry.raster).await?;
        }
        Ok(())
    }

    /// Whether a raster was persisted for this product and date.
    async fn exists(&self, product: &str, date: NaiveDate) -> Result<bool>;

    /// Reload a persisted raster, `None` when absent.
    async fn load_raster(&self, product: &str, date: NaiveDate) -> Result<Option<Raster>>;

    /// Reload a persisted band stack with its metadata, `None` when absent.
    async fn load_bands(&self, name: &str) -> Result<Option<(ExportMetadata, Vec<Raster>)>>;
}

/// An [`ExportSink`] holding everything in memory, for tests and dry runs.
#[derive(Default)]
pub struct InMemorySink {
    rasters: Mutex<BTreeMap<(String, NaiveDate), Raster>>,
    bands: Mutex<BTreeMap<String, (ExportMetadata, Vec<Raster>)>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The (product, date) keys persisted so far, in order.
    pub async fn keys(&self) -> Vec<(String, NaiveDate)> {
        self.rasters.lock().await.keys().cloned().collect()
    }

    /// Number of persisted daily rasters.
    pub async fn len(&self) -> usize {
        self.rasters.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rasters.lock().await.is_empty()
    }
}

#[async_trait]
impl ExportSink for InMemorySink {
    async fn persist_raster(&self, product: &str, date: NaiveDate, raster: &Raster) -> Result<()> {
        self.rasters
            .lock()
            .await
            .insert((product.to_string(), date), raster.clone());
        Ok(())
    }

    async fn persist_bands(
        &self,
        name: &str,
        meta: &ExportMetadata,
        bands: &[Raster],
    ) -> Result<()> {
        self.bands
            .lock()
            .await
            .insert(name.to_string(), (meta.clone(), bands.to_vec()));
        Ok(())
    }

    async fn exists(&self, product: &str, date: NaiveDate) -> Result<bool> {
        Ok(self
            .rasters
            .lock()
            .await
            .contains_key(&(product.to_string(), date)))
    }

    async fn load_raster(&self, product: &str, date: NaiveDate) -> Result<Option<Raster>> {
        Ok(self
            .rasters
            .lock()
            .await
            .get(&(product.to_string(), date))
            .cloned())
    }

    async fn load_bands(&self, name: &str) -> Result<Option<(ExportMetadata, Vec<Raster>)>> {
        Ok(self.bands.lock().await.get(name).cloned())
    }
}
