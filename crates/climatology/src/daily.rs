//! Day-of-year interpolation of the monthly climatology.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::debug;

use reef_common::time::{clamp_day_of_year, day_of_year, MAX_DAY_OF_YEAR};
use reef_common::{Grid, Raster, ReefError, ReefResult};

use crate::monthly::MonthlyClimatology;

/// Anchor day-of-year for each calendar month: the 15th of the month under
/// a fixed non-leap reference calendar.
pub const ANCHOR_DAYS: [u16; 12] = [15, 46, 74, 105, 135, 166, 196, 227, 258, 288, 319, 349];

/// Anchor sequence extended circularly so every day in [1, 366] falls
/// strictly between two anchors. The virtual anchors sit 365 days out from
/// the real December and January anchors: the previous year's December 15
/// is 16 days before day 1.
const EXTENDED_ANCHORS: [i32; 14] = [
    -16, 15, 46, 74, 105, 135, 166, 196, 227, 258, 288, 319, 349, 380,
];

/// Zero-based month backing each extended anchor (December wraps both ends).
const EXTENDED_MONTHS: [usize; 14] = [11, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 0];

/// Bracketing anchor pair for a day: zero-based months and the
/// interpolation fraction between them.
fn bracket(day: u16) -> (usize, usize, f32) {
    let d = day as i32;
    let k = (0..EXTENDED_ANCHORS.len() - 1)
        .rev()
        .find(|&k| EXTENDED_ANCHORS[k] <= d)
        .unwrap_or(0);

    let lo = EXTENDED_ANCHORS[k];
    let hi = EXTENDED_ANCHORS[k + 1];
    let frac = (d - lo) as f32 / (hi - lo) as f32;
    (EXTENDED_MONTHS[k], EXTENDED_MONTHS[k + 1], frac)
}

/// The daily climatology: 366 rasters indexed by day-of-year.
///
/// Piecewise-linear interpolation of the 12 Monthly Mean rasters, exact at
/// every anchor day and continuous across the December-January boundary.
/// Day 366 is served to leap and non-leap years alike.
#[derive(Debug, Clone)]
pub struct DailyClimatology {
    grid: Grid,
    days: Vec<Raster>,
}

impl DailyClimatology {
    /// Interpolate the monthly climatology into 366 daily rasters.
    ///
    /// A cell that is no-data in either bracketing month is no-data for
    /// every day of that bracket. Days are built in parallel.
    pub fn interpolate(monthly: &MonthlyClimatology) -> ReefResult<Self> {
        let grid = *monthly.grid();

        let days = (1..=MAX_DAY_OF_YEAR)
            .into_par_iter()
            .map(|day| {
                let (lo, hi, frac) = bracket(day);
                monthly.months()[lo].zip_map(&monthly.months()[hi], |v_lo, v_hi| {
                    v_lo + frac * (v_hi - v_lo)
                })
            })
            .collect::<ReefResult<Vec<Raster>>>()?;

        debug!(days = days.len(), "daily climatology interpolated");
        Ok(Self { grid, days })
    }

    /// Rebuild from 366 stored rasters (day 1 first).
    pub fn from_rasters(days: Vec<Raster>) -> ReefResult<Self> {
        if days.len() != MAX_DAY_OF_YEAR as usize {
            return Err(ReefError::ShapeMismatch {
                expected: MAX_DAY_OF_YEAR as usize,
                actual: days.len(),
            });
        }

        let grid = *days[0].grid();
        for day in &days[1..] {
            if *day.grid() != grid {
                return Err(ReefError::grid_mismatch(&grid, day.grid()));
            }
        }

        Ok(Self { grid, days })
    }

    /// The grid all daily rasters share.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Baseline raster for a day-of-year, clamped to [1, 366].
    pub fn for_day(&self, day_of_year: u16) -> &Raster {
        let day = clamp_day_of_year(day_of_year as u32);
        &self.days[day as usize - 1]
    }

    /// Baseline raster for a calendar date.
    pub fn for_date(&self, date: NaiveDate) -> &Raster {
        self.for_day(day_of_year(date))
    }

    /// All 366 rasters, day 1 first.
    pub fn days(&self) -> &[Raster] {
        &self.days
    }
}
