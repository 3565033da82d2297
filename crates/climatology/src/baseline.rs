//! The assembled climatology baseline: monthly means, MMM and daily curve.

use tracing::info;

use reef_common::{Grid, GridSeries, Raster, ReefError, ReefResult};

use crate::config::ClimatologyConfig;
use crate::daily::DailyClimatology;
use crate::monthly::MonthlyClimatology;

/// Everything downstream heat-stress products need from the baseline era:
/// the 12 trend-corrected Monthly Mean rasters, the Maximum Monthly Mean
/// raster and the 366-day interpolated climatology.
///
/// Computed once from the baseline-era archive and persisted; reloaded from
/// storage on every daily run.
#[derive(Debug, Clone)]
pub struct ClimatologyBaseline {
    monthly: MonthlyClimatology,
    mmm: Raster,
    daily: DailyClimatology,
}

impl ClimatologyBaseline {
    /// Estimate the full baseline from a baseline-era SST series.
    pub fn compute(series: &GridSeries, config: &ClimatologyConfig) -> ReefResult<Self> {
        info!(
            baseline_start = config.baseline_start,
            baseline_end = config.baseline_end,
            reference_year = config.reference_year,
            grid = %series.grid().describe(),
            "computing climatology baseline"
        );
        let monthly = MonthlyClimatology::estimate(series, config)?;
        Self::from_monthly(monthly)
    }

    /// Derive MMM and the daily curve from an already-estimated monthly
    /// climatology.
    pub fn from_monthly(monthly: MonthlyClimatology) -> ReefResult<Self> {
        let mmm = monthly.max_monthly_mean();
        let daily = DailyClimatology::interpolate(&monthly)?;
        Ok(Self {
            monthly,
            mmm,
            daily,
        })
    }

    /// Reassemble a baseline from persisted parts.
    ///
    /// All parts must share one grid; mixing grids from different baseline
    /// runs is rejected.
    pub fn from_parts(
        monthly: MonthlyClimatology,
        mmm: Raster,
        daily: DailyClimatology,
    ) -> ReefResult<Self> {
        if mmm.grid() != monthly.grid() {
            return Err(ReefError::grid_mismatch(monthly.grid(), mmm.grid()));
        }
        if daily.grid() != monthly.grid() {
            return Err(ReefError::grid_mismatch(monthly.grid(), daily.grid()));
        }
        Ok(Self {
            monthly,
            mmm,
            daily,
        })
    }

    /// The grid every baseline raster shares.
    pub fn grid(&self) -> &Grid {
        self.monthly.grid()
    }

    /// The 12 Monthly Mean rasters.
    pub fn monthly(&self) -> &MonthlyClimatology {
        &self.monthly
    }

    /// The Maximum Monthly Mean raster.
    pub fn max_monthly_mean(&self) -> &Raster {
        &self.mmm
    }

    /// The 366-day interpolated climatology.
    pub fn daily(&self) -> &DailyClimatology {
        &self.daily
    }
}
