//! Common fixtures for reef pipeline tests.

use chrono::NaiveDate;
use reef_common::{BoundingBox, Grid};

/// A 4x3 grid over a small coral-sea extent. Big enough to expose row-major
/// indexing bugs, small enough to eyeball in failures.
pub fn small_grid() -> Grid {
    Grid::new(BoundingBox::new(145.0, -18.0, 149.0, -15.0), 4, 3)
}

/// A single-cell grid for scalar-level scenario tests.
pub fn single_cell_grid() -> Grid {
    Grid::new(BoundingBox::new(146.0, -17.0, 146.25, -16.75), 1, 1)
}

/// Shorthand for building test dates.
///
/// Panics on invalid dates, which in a test is the right failure mode.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day}"))
}
