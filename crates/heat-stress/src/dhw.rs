//! Sliding-window Degree Heating Weeks accumulation.
//!
//! DHW for a day is the sum of that day's trailing window of HotSpots at
//! or above the accumulation threshold, divided by seven to express the
//! total in degree-weeks. The accumulator keeps the window's per-cell sum
//! and missing-day count incrementally, so a backfill over years of data
//! costs one add and one subtract per cell per day instead of a full
//! window scan.

use std::collections::VecDeque;

use rayon::prelude::*;
use tracing::debug;

use reef_common::{DateRange, Grid, GridSeries, Raster, ReefError, ReefResult};

use crate::config::DhwConfig;

/// DHW is expressed in degree-weeks.
const DAYS_PER_WEEK: f64 = 7.0;

/// Incremental DHW accumulator over a day-by-day HotSpot feed.
///
/// Feed one raster per calendar day in order, using
/// [`advance_missing`](Self::advance_missing) for days with no satellite
/// coverage. A cell's DHW is defined only when every day of its window
/// carried a value; one missing day poisons the cell until that day slides
/// out of the window.
#[derive(Debug)]
pub struct DhwAccumulator {
    config: DhwConfig,
    grid: Grid,
    /// Thresholded contributions inside the window, oldest first.
    window: VecDeque<Raster>,
    /// Per-cell sum of the window's contributions, in f64 to keep the
    /// running total stable over long backfills.
    sum: Vec<f64>,
    /// Per-cell count of missing days inside the window.
    missing: Vec<u32>,
}

impl DhwAccumulator {
    pub fn new(grid: Grid, config: DhwConfig) -> Self {
        let cells = grid.len();
        let window = VecDeque::with_capacity(config.window_days + 1);
        Self {
            config,
            grid,
            window,
            sum: vec![0.0; cells],
            missing: vec![0; cells],
        }
    }

    /// The grid every fed raster must share.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &DhwConfig {
        &self.config
    }

    /// Number of days currently inside the window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Feed one day of HotSpots.
    ///
    /// Returns the day's DHW raster once the window is full, `None` while
    /// it is still warming up.
    pub fn advance(&mut self, hotspot: &Raster) -> ReefResult<Option<Raster>> {
        if *hotspot.grid() != self.grid {
            return Err(ReefError::grid_mismatch(&self.grid, hotspot.grid()));
        }

        let threshold = self.config.hotspot_threshold;
        let contribution = hotspot.map(|v| if v >= threshold { v } else { 0.0 });
        Ok(self.push(contribution))
    }

    /// Feed one day with no satellite coverage.
    ///
    /// Every cell counts the day as missing, so every cell's DHW is
    /// no-data until the day leaves the window.
    pub fn advance_missing(&mut self) -> Option<Raster> {
        self.push(Raster::nodata(self.grid))
    }

    fn push(&mut self, contribution: Raster) -> Option<Raster> {
        self.sum
            .par_iter_mut()
            .zip(self.missing.par_iter_mut())
            .enumerate()
            .for_each(|(idx, (sum, missing))| match contribution.get(idx) {
                Some(v) => *sum += v as f64,
                None => *missing += 1,
            });
        self.window.push_back(contribution);

        if self.window.len() > self.config.window_days {
            if let Some(oldest) = self.window.pop_front() {
                self.sum
                    .par_iter_mut()
                    .zip(self.missing.par_iter_mut())
                    .enumerate()
                    .for_each(|(idx, (sum, missing))| match oldest.get(idx) {
                        Some(v) => *sum -= v as f64,
                        None => *missing -= 1,
                    });
            }
        }

        if self.window.len() == self.config.window_days {
            Some(self.emit())
        } else {
            None
        }
    }

    fn emit(&self) -> Raster {
        let mut out = Raster::nodata(self.grid);
        for idx in 0..self.grid.len() {
            if self.missing[idx] == 0 {
                out.set(idx, (self.sum[idx] / DAYS_PER_WEEK) as f32);
            }
        }
        out
    }
}

/// Accumulate DHW for every day of `output`, reading HotSpots from
/// `hotspots` and treating absent dates as missing coverage.
///
/// The feed starts `window_days - 1` days before `output.start` so the
/// first output day already has a full window behind it.
pub fn accumulate_series(
    hotspots: &GridSeries,
    config: &DhwConfig,
    output: DateRange,
) -> ReefResult<GridSeries> {
    let grid = *hotspots.grid();
    let mut accumulator = DhwAccumulator::new(grid, config.clone());
    let mut series = GridSeries::new("dhw", grid);

    let feed = output.with_lookback(config.window_days.saturating_sub(1) as u32);
    for day in feed.iter() {
        let emitted = match hotspots.get(day) {
            Some(hs) => accumulator.advance(hs)?,
            None => accumulator.advance_missing(),
        };

        if let Some(dhw) = emitted {
            series.insert(day, dhw)?;
        }
    }

    debug!(
        days = series.len(),
        start = %output.start,
        end = %output.end,
        "degree heating weeks accumulated"
    );
    Ok(series)
}
