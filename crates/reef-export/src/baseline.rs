//! Persisting and reloading the climatology baseline.
//!
//! The baseline is computed once per grid and baseline window, then reused
//! by every daily run. It is stored through the export sink as three
//! band-stacked assets under `baseline/`: the 12 Monthly Mean rasters, the
//! Maximum Monthly Mean, and the 366-day interpolated climatology. Each
//! asset carries the baseline window in its metadata so a run can verify
//! what it loads.

use std::sync::Arc;

use tracing::info;

use climatology::{ClimatologyBaseline, ClimatologyConfig, DailyClimatology, MonthlyClimatology};
use reef_common::{Raster, MAX_DAY_OF_YEAR};

use crate::error::{ExportError, Result};
use crate::sink::{ExportMetadata, ExportSink};

const MONTHLY_ASSET: &str = "baseline/monthly_mean";
const MMM_ASSET: &str = "baseline/max_monthly_mean";
const DAILY_ASSET: &str = "baseline/daily_climatology";

/// Persists and reloads one [`ClimatologyBaseline`] through an export sink.
pub struct BaselineStore {
    sink: Arc<dyn ExportSink>,
}

impl BaselineStore {
    pub fn new(sink: Arc<dyn ExportSink>) -> Self {
        Self { sink }
    }

    /// Whether a baseline has been persisted behind this sink.
    pub async fn exists(&self) -> Result<bool> {
        Ok(self.sink.load_bands(MONTHLY_ASSET).await?.is_some())
    }

    /// Persist all three baseline assets.
    pub async fn save(
        &self,
        baseline: &ClimatologyBaseline,
        window: &ClimatologyConfig,
    ) -> Result<()> {
        let grid = baseline.grid();
        info!(
            grid = %grid.describe(),
            baseline_start = window.baseline_start,
            baseline_end = window.baseline_end,
            "persisting climatology baseline"
        );

        let monthly_meta = ExportMetadata::bands(
            "monthly_mean",
            "Trend-projected monthly mean SST at the reference year",
            grid,
        )
        .with_band_labels((1..=12).map(|m| format!("{m:02}")).collect())
        .with_window(
            window.baseline_start,
            window.baseline_end,
            window.reference_year,
        );
        self.sink
            .persist_bands(MONTHLY_ASSET, &monthly_meta, baseline.monthly().months())
            .await?;

        let mmm_meta = ExportMetadata::bands(
            "max_monthly_mean",
            "Maximum monthly mean SST, the bleaching threshold baseline",
            grid,
        )
        .with_window(
            window.baseline_start,
            window.baseline_end,
            window.reference_year,
        );
        self.sink
            .persist_bands(
                MMM_ASSET,
                &mmm_meta,
                std::slice::from_ref(baseline.max_monthly_mean()),
            )
            .await?;

        let daily_meta = ExportMetadata::bands(
            "daily_climatology",
            "Daily SST climatology; band index plus one is the day of year",
            grid,
        )
        .with_window(
            window.baseline_start,
            window.baseline_end,
            window.reference_year,
        );
        self.sink
            .persist_bands(DAILY_ASSET, &daily_meta, baseline.daily().days())
            .await?;

        Ok(())
    }

    /// Reassemble the baseline from its persisted assets.
    ///
    /// Fails when any asset is absent; the baseline must be precomputed
    /// before analysis runs.
    pub async fn load(&self) -> Result<ClimatologyBaseline> {
        let months = self.load_asset(MONTHLY_ASSET, 12).await?;
        let mut mmm_bands = self.load_asset(MMM_ASSET, 1).await?;
        let days = self
            .load_asset(DAILY_ASSET, MAX_DAY_OF_YEAR as usize)
            .await?;

        let monthly = MonthlyClimatology::new(months)?;
        let mmm = mmm_bands
            .pop()
            .ok_or_else(|| ExportError::invalid_metadata("empty max monthly mean stack"))?;
        let daily = DailyClimatology::from_rasters(days)?;

        let baseline = ClimatologyBaseline::from_parts(monthly, mmm, daily)?;
        info!(grid = %baseline.grid().describe(), "climatology baseline loaded");
        Ok(baseline)
    }

    /// The baseline window recorded when the stored baseline was computed.
    pub async fn stored_window(&self) -> Result<Option<ClimatologyConfig>> {
        let meta = match self.sink.load_bands(MONTHLY_ASSET).await? {
            Some((meta, _)) => meta,
            None => return Ok(None),
        };

        Ok(
            match (meta.baseline_start, meta.baseline_end, meta.reference_year) {
                (Some(baseline_start), Some(baseline_end), Some(reference_year)) => {
                    Some(ClimatologyConfig {
                        baseline_start,
                        baseline_end,
                        reference_year,
                    })
                }
                _ => None,
            },
        )
    }

    async fn load_asset(&self, name: &str, expected: usize) -> Result<Vec<Raster>> {
        let (_, bands) = self.sink.load_bands(name).await?.ok_or_else(|| {
            ExportError::open_failed(format!(
                "baseline asset {name} not found in the export store"
            ))
        })?;

        if bands.len() != expected {
            return Err(ExportError::invalid_metadata(format!(
                "expected {expected} bands in {name}, found {}",
                bands.len()
            )));
        }
        Ok(bands)
    }
}
