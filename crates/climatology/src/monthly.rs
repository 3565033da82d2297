//! Per-month yearly means and the trend regression behind the Monthly Mean.

use rayon::prelude::*;
use tracing::debug;

use reef_common::time::DateRange;
use reef_common::{Grid, GridSeries, Raster, ReefError, ReefResult};

use crate::config::ClimatologyConfig;

/// Minimum valid yearly samples a cell needs for its regression.
///
/// Cells with fewer valid years are no-data in the Monthly Mean; this is a
/// cell-local data condition, never a batch failure.
pub const MIN_BASELINE_YEARS: u32 = 2;

/// Per-cell mean of all observations falling in one calendar month.
///
/// Cells with zero observations in the month are no-data.
pub fn monthly_mean(series: &GridSeries, year: i32, month: u32) -> ReefResult<Raster> {
    let grid = *series.grid();
    let window = DateRange::month(year, month)?;

    let mut sums = vec![0.0_f64; grid.len()];
    let mut counts = vec![0_u32; grid.len()];

    for entry in series.range(window) {
        for idx in 0..grid.len() {
            if let Some(v) = entry.raster.get(idx) {
                sums[idx] += v as f64;
                counts[idx] += 1;
            }
        }
    }

    let mut mean = Raster::nodata(grid);
    for idx in 0..grid.len() {
        if counts[idx] > 0 {
            mean.set(idx, (sums[idx] / counts[idx] as f64) as f32);
        }
    }
    Ok(mean)
}

/// Streaming per-cell ordinary-least-squares fit of yearly means against
/// the year.
///
/// Accumulates one yearly-mean raster at a time so the caller can process a
/// single month of source data per step and never hold the full baseline
/// record in memory. Accumulators are f64; with integer years the normal
/// equations' denominator is exact and a sample lying perfectly on a line
/// is recovered perfectly.
pub struct MonthlyRegression {
    grid: Grid,
    count: Vec<u32>,
    sum_x: Vec<f64>,
    sum_y: Vec<f64>,
    sum_xy: Vec<f64>,
    sum_xx: Vec<f64>,
}

impl MonthlyRegression {
    /// Create an empty regression over `grid`.
    pub fn new(grid: Grid) -> Self {
        let n = grid.len();
        Self {
            grid,
            count: vec![0; n],
            sum_x: vec![0.0; n],
            sum_y: vec![0.0; n],
            sum_xy: vec![0.0; n],
            sum_xx: vec![0.0; n],
        }
    }

    /// Fold in one year's per-cell means. No-data cells are skipped and
    /// simply shrink that cell's sample.
    pub fn add_year(&mut self, year: i32, yearly_mean: &Raster) -> ReefResult<()> {
        if *yearly_mean.grid() != self.grid {
            return Err(ReefError::grid_mismatch(&self.grid, yearly_mean.grid()));
        }

        let x = year as f64;
        for idx in 0..self.grid.len() {
            if let Some(v) = yearly_mean.get(idx) {
                let y = v as f64;
                self.count[idx] += 1;
                self.sum_x[idx] += x;
                self.sum_y[idx] += y;
                self.sum_xy[idx] += x * y;
                self.sum_xx[idx] += x * x;
            }
        }
        Ok(())
    }

    /// Evaluate the fitted line at `reference_year` for every cell.
    ///
    /// Cells with fewer than [`MIN_BASELINE_YEARS`] valid samples are
    /// no-data. Rows are evaluated in parallel; cells are independent.
    pub fn evaluate(&self, reference_year: f64) -> ReefResult<Raster> {
        let width = self.grid.width.max(1);
        let mut values = vec![0.0_f32; self.grid.len()];
        let mut valid = vec![false; self.grid.len()];

        values
            .par_chunks_mut(width)
            .zip(valid.par_chunks_mut(width))
            .enumerate()
            .for_each(|(row, (value_row, valid_row))| {
                for col in 0..value_row.len() {
                    let idx = row * width + col;
                    let n = self.count[idx];
                    if n < MIN_BASELINE_YEARS {
                        continue;
                    }

                    let nf = n as f64;
                    let denom = nf * self.sum_xx[idx] - self.sum_x[idx] * self.sum_x[idx];
                    if denom == 0.0 {
                        // Identical year fed twice; cannot fit a slope.
                        continue;
                    }

                    let slope =
                        (nf * self.sum_xy[idx] - self.sum_x[idx] * self.sum_y[idx]) / denom;
                    let intercept = (self.sum_y[idx] - slope * self.sum_x[idx]) / nf;

                    value_row[col] = (intercept + slope * reference_year) as f32;
                    valid_row[col] = true;
                }
            });

        Raster::from_values(self.grid, values, valid)
    }
}

/// The 12 trend-projected Monthly Mean rasters.
#[derive(Debug, Clone)]
pub struct MonthlyClimatology {
    grid: Grid,
    months: Vec<Raster>,
}

impl MonthlyClimatology {
    /// Build from 12 rasters (January first), verifying they share a grid.
    pub fn new(months: Vec<Raster>) -> ReefResult<Self> {
        if months.len() != 12 {
            return Err(ReefError::ShapeMismatch {
                expected: 12,
                actual: months.len(),
            });
        }

        let grid = *months[0].grid();
        for month in &months[1..] {
            if *month.grid() != grid {
                return Err(ReefError::grid_mismatch(&grid, month.grid()));
            }
        }

        Ok(Self { grid, months })
    }

    /// Estimate the full monthly climatology from a baseline SST series.
    ///
    /// Convenience driver over [`monthly_mean`] and [`MonthlyRegression`];
    /// callers that stream source data month by month drive those two
    /// directly instead.
    pub fn estimate(series: &GridSeries, config: &ClimatologyConfig) -> ReefResult<Self> {
        let grid = *series.grid();
        let mut months = Vec::with_capacity(12);

        for month in 1..=12_u32 {
            let mut regression = MonthlyRegression::new(grid);
            for year in config.years() {
                let yearly = monthly_mean(series, year, month)?;
                regression.add_year(year, &yearly)?;
            }

            let raster = regression.evaluate(config.reference_year)?;
            debug!(
                month,
                valid_cells = raster.valid_count(),
                "monthly mean regression evaluated"
            );
            months.push(raster);
        }

        Self::new(months)
    }

    /// The grid all 12 rasters share.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Raster for a 1-based calendar month.
    pub fn month(&self, month: u32) -> &Raster {
        &self.months[month as usize - 1]
    }

    /// All 12 rasters, January first.
    pub fn months(&self) -> &[Raster] {
        &self.months
    }

    /// Per-cell maximum over the 12 months, ignoring no-data months.
    ///
    /// A cell is no-data only when every month is no-data there.
    pub fn max_monthly_mean(&self) -> Raster {
        let mut mmm = Raster::nodata(self.grid);
        for month in &self.months {
            for idx in 0..self.grid.len() {
                if let Some(v) = month.get(idx) {
                    match mmm.get(idx) {
                        Some(current) if current >= v => {}
                        _ => mmm.set(idx, v),
                    }
                }
            }
        }
        mmm
    }
}
