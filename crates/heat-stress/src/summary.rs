//! Regional statistics over product rasters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use reef_common::Raster;

/// Mean, spread and 95% confidence interval of a product over the valid
/// cells of a raster. All statistics are rounded to four decimals for the
/// published summaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub count: u32,
    pub ci95: f64,
}

impl RegionSummary {
    /// Reduce a raster over its valid cells.
    ///
    /// Returns `None` when every cell is no-data; a summary of nothing is
    /// not a row of zeros.
    pub fn of(raster: &Raster) -> Option<Self> {
        let mut count = 0u32;
        let mut sum = 0.0f64;
        for v in raster.iter().flatten() {
            count += 1;
            sum += v as f64;
        }
        if count == 0 {
            return None;
        }
        let mean = sum / count as f64;

        let mut sq_sum = 0.0f64;
        for v in raster.iter().flatten() {
            let d = v as f64 - mean;
            sq_sum += d * d;
        }
        let std_dev = (sq_sum / count as f64).sqrt();
        let ci95 = 1.96 * std_dev / (count as f64).sqrt();

        Some(Self {
            mean: round4(mean),
            std_dev: round4(std_dev),
            count,
            ci95: round4(ci95),
        })
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// One row of the published daily summary: each product reduced over the
/// region on one date. Serialized as a JSON line and appended to the
/// summary file by the pipeline service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sst: Option<RegionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<RegionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhw: Option<RegionSummary>,
}

impl DailySummary {
    /// An empty row for a date; attach products with the `with_*` methods.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sst: None,
            anomaly: None,
            dhw: None,
        }
    }

    /// Attach SST statistics; an all-no-data raster leaves the field empty.
    pub fn with_sst(mut self, raster: &Raster) -> Self {
        self.sst = RegionSummary::of(raster);
        self
    }

    /// Attach anomaly statistics.
    pub fn with_anomaly(mut self, raster: &Raster) -> Self {
        self.anomaly = RegionSummary::of(raster);
        self
    }

    /// Attach DHW statistics.
    pub fn with_dhw(mut self, raster: &Raster) -> Self {
        self.dhw = RegionSummary::of(raster);
        self
    }
}
