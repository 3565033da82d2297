//! Deterministic generators for synthetic SST-like test data.
//!
//! All generators produce predictable, verifiable patterns so tests can
//! assert exact expectations rather than statistical ones.

use chrono::NaiveDate;
use reef_common::{DateRange, Grid, GridSeries, Raster};

/// Raster where each cell holds `col * 1000 + row`.
///
/// Makes index mix-ups obvious: reading cell (col, row) anywhere downstream
/// must yield `col * 1000 + row`.
pub fn coordinate_raster(grid: Grid) -> Raster {
    let mut raster = Raster::nodata(grid);
    for row in 0..grid.height {
        for col in 0..grid.width {
            raster.set(grid.index(col, row), (col * 1000 + row) as f32);
        }
    }
    raster
}

/// Raster filled with `value` except for no-data holes at the given
/// (col, row) positions.
pub fn raster_with_holes(grid: Grid, value: f32, holes: &[(usize, usize)]) -> Raster {
    let mut raster = Raster::filled(grid, value);
    for &(col, row) in holes {
        if col < grid.width && row < grid.height {
            raster.clear(grid.index(col, row));
        }
    }
    raster
}

/// Series with one raster per day in `range`, every cell set to `value`.
pub fn constant_series(
    variable: &str,
    grid: Grid,
    range: DateRange,
    value: f32,
) -> GridSeries {
    series_from_fn(variable, grid, range, |_, _| Some(value))
}

/// Series with one raster per day built from a per-cell closure.
///
/// The closure receives the date and the flat cell index and returns the
/// cell value, or `None` for no-data. This is the workhorse for scenario
/// tests: yearly means on a line, seasonal cycles, punched-out days.
pub fn series_from_fn(
    variable: &str,
    grid: Grid,
    range: DateRange,
    f: impl Fn(NaiveDate, usize) -> Option<f32>,
) -> GridSeries {
    let mut series = GridSeries::new(variable, grid);
    for day in range.iter() {
        let mut raster = Raster::nodata(grid);
        for idx in 0..grid.len() {
            if let Some(v) = f(day, idx) {
                raster.set(idx, v);
            }
        }
        series
            .insert(day, raster)
            .unwrap_or_else(|e| panic!("series generator produced invalid series: {e}"));
    }
    series
}
