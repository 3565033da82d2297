//! Pipeline configuration.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use climatology::ClimatologyConfig;
use heat_stress::DhwConfig;
use reef_common::bbox::regions;
use reef_common::{BoundingBox, Grid};
use reef_export::ExportConfig;

/// Top-level pipeline configuration.
///
/// Loaded from a YAML file when one is given, otherwise the defaults
/// describe the operational Great Barrier Reef product. Environment
/// variables overlay whichever base was loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Region and grid of the analysis.
    #[serde(default)]
    pub region: RegionConfig,

    /// Climatology baseline window.
    #[serde(default)]
    pub climatology: ClimatologyConfig,

    /// DHW accumulation window and threshold.
    #[serde(default)]
    pub dhw: DhwConfig,

    /// Chunking and compression of exported arrays.
    #[serde(default)]
    pub export: ExportConfig,

    /// Where daily SST comes from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Where products and the daily summary go.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region: RegionConfig::default(),
            climatology: ClimatologyConfig::default(),
            dhw: DhwConfig::default(),
            export: ExportConfig::default(),
            source: SourceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Overlay environment variables onto the loaded configuration.
    pub fn apply_env(&mut self) {
        self.climatology.apply_env();
        self.dhw.apply_env();
        self.export.apply_env();

        if let Ok(val) = env::var("REEF_STORE_ROOT") {
            self.output.store_root = PathBuf::from(val);
        }

        if let Ok(val) = env::var("REEF_SUMMARY_FILE") {
            self.output.summary_file = PathBuf::from(val);
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.region
            .validate()
            .map_err(|e| anyhow::anyhow!("region: {e}"))?;
        self.climatology
            .validate()
            .map_err(|e| anyhow::anyhow!("climatology: {e}"))?;
        self.dhw
            .validate()
            .map_err(|e| anyhow::anyhow!("dhw: {e}"))?;
        self.export
            .validate()
            .map_err(|e| anyhow::anyhow!("export: {e}"))?;
        Ok(())
    }
}

/// The analysis region and its raster resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Bounding box as `[min_lon, min_lat, max_lon, max_lat]`.
    pub bbox: [f64; 4],

    /// Cell edge length in degrees.
    pub resolution_deg: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        let gbr = regions::great_barrier_reef();
        Self {
            bbox: [gbr.min_lon, gbr.min_lat, gbr.max_lon, gbr.max_lat],
            resolution_deg: 0.25,
        }
    }
}

impl RegionConfig {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3])
    }

    /// The analysis grid covering the region at the configured resolution.
    pub fn grid(&self) -> Grid {
        Grid::with_resolution(self.bounding_box(), self.resolution_deg)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bbox.iter().any(|v| !v.is_finite()) {
            return Err("bbox must be finite".to_string());
        }

        if self.bbox[0] >= self.bbox[2] || self.bbox[1] >= self.bbox[3] {
            return Err(format!(
                "bbox must have min < max, got [{}, {}, {}, {}]",
                self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3]
            ));
        }

        if !(self.resolution_deg > 0.0) {
            return Err(format!(
                "resolution_deg must be positive, got {}",
                self.resolution_deg
            ));
        }

        Ok(())
    }
}

/// Daily SST source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceConfig {
    /// Zarr V3 archive on the local filesystem
    Zarr {
        /// Store root directory
        root: PathBuf,
        /// Array path inside the store
        path: String,
    },

    /// Deterministic synthetic field, for smoke tests without an archive
    Synthetic,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Synthetic
    }
}

/// Output locations for products and the daily summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the product store.
    pub store_root: PathBuf,

    /// JSONL file the per-day summary rows are appended to.
    pub summary_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("data/products"),
            summary_file: PathBuf::from("data/summary.jsonl"),
        }
    }
}
