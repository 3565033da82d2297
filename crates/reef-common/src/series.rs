//! Date-indexed raster series for one named variable.

use chrono::NaiveDate;

use crate::error::{ReefError, ReefResult};
use crate::time::DateRange;
use crate::{Grid, Raster};

/// A raster paired with its calendar date.
#[derive(Debug, Clone)]
pub struct TimestampedRaster {
    pub date: NaiveDate,
    pub raster: Raster,
}

/// An ordered-by-date sequence of rasters for one variable over one grid.
///
/// Dates need not be contiguous; an absent day is simply absent, never an
/// implicit zero. At most one entry may exist per calendar day.
#[derive(Debug, Clone)]
pub struct GridSeries {
    variable: String,
    grid: Grid,
    entries: Vec<TimestampedRaster>,
}

impl GridSeries {
    /// Create an empty series for `variable` over `grid`.
    pub fn new(variable: impl Into<String>, grid: Grid) -> Self {
        Self {
            variable: variable.into(),
            grid,
            entries: Vec::new(),
        }
    }

    /// Variable name, e.g. "sst".
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The grid shared by every raster in the series.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the series has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a raster for a date, keeping entries sorted.
    ///
    /// Fails with [`ReefError::GridMismatch`] when the raster's grid differs
    /// from the series grid and with [`ReefError::DuplicateDate`] when the
    /// date is already present.
    pub fn insert(&mut self, date: NaiveDate, raster: Raster) -> ReefResult<()> {
        if *raster.grid() != self.grid {
            return Err(ReefError::grid_mismatch(&self.grid, raster.grid()));
        }

        match self.entries.binary_search_by_key(&date, |e| e.date) {
            Ok(_) => Err(ReefError::DuplicateDate(date)),
            Err(pos) => {
                self.entries.insert(pos, TimestampedRaster { date, raster });
                Ok(())
            }
        }
    }

    /// Raster for an exact date, if present.
    pub fn get(&self, date: NaiveDate) -> Option<&Raster> {
        self.entries
            .binary_search_by_key(&date, |e| e.date)
            .ok()
            .map(|pos| &self.entries[pos].raster)
    }

    /// All entries in date order.
    pub fn entries(&self) -> &[TimestampedRaster] {
        &self.entries
    }

    /// Iterate entries in date order.
    pub fn iter(&self) -> impl Iterator<Item = &TimestampedRaster> {
        self.entries.iter()
    }

    /// Iterate the dates present in the series.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.iter().map(|e| e.date)
    }

    /// Earliest date in the series.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.date)
    }

    /// Latest date in the series.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }

    /// Iterate the entries whose dates fall inside `range`.
    pub fn range(&self, range: DateRange) -> impl Iterator<Item = &TimestampedRaster> {
        self.entries
            .iter()
            .filter(move |e| range.contains(e.date))
    }

    /// Per-cell maximum over every entry, ignoring no-data.
    ///
    /// A cell is no-data in the composite only when it is no-data on every
    /// date. Returns `None` for an empty series.
    pub fn max_composite(&self) -> ReefResult<Option<Raster>> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        let mut composite = Raster::nodata(self.grid);
        for entry in &self.entries {
            composite.merge_max(&entry.raster)?;
        }
        Ok(Some(composite))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;

    fn test_grid() -> Grid {
        Grid::new(BoundingBox::new(0.0, 0.0, 3.0, 2.0), 3, 2)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_insert_keeps_date_order() {
        let grid = test_grid();
        let mut series = GridSeries::new("sst", grid);
        series.insert(date(2024, 1, 3), Raster::filled(grid, 3.0)).unwrap();
        series.insert(date(2024, 1, 1), Raster::filled(grid, 1.0)).unwrap();
        series.insert(date(2024, 1, 2), Raster::filled(grid, 2.0)).unwrap();

        let dates: Vec<_> = series.dates().collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
        assert_eq!(series.first_date(), Some(date(2024, 1, 1)));
        assert_eq!(series.last_date(), Some(date(2024, 1, 3)));
    }

    #[test]
    fn test_insert_rejects_duplicate_date() {
        let grid = test_grid();
        let mut series = GridSeries::new("sst", grid);
        series.insert(date(2024, 1, 1), Raster::filled(grid, 1.0)).unwrap();

        let result = series.insert(date(2024, 1, 1), Raster::filled(grid, 2.0));
        assert!(matches!(result, Err(ReefError::DuplicateDate(_))));
    }

    #[test]
    fn test_insert_rejects_foreign_grid() {
        let mut series = GridSeries::new("sst", test_grid());
        let other = Grid::new(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 2, 2);

        let result = series.insert(date(2024, 1, 1), Raster::filled(other, 1.0));
        assert!(matches!(result, Err(ReefError::GridMismatch { .. })));
    }

    #[test]
    fn test_get_and_range() {
        let grid = test_grid();
        let mut series = GridSeries::new("sst", grid);
        for day in 1..=10 {
            series.insert(date(2024, 3, day), Raster::filled(grid, day as f32)).unwrap();
        }

        assert_eq!(series.get(date(2024, 3, 4)).unwrap().get(0), Some(4.0));
        assert!(series.get(date(2024, 4, 1)).is_none());

        let window = DateRange::new(date(2024, 3, 3), date(2024, 3, 6)).unwrap();
        let selected: Vec<_> = series.range(window).map(|e| e.date).collect();
        assert_eq!(selected.len(), 4);
        assert_eq!(selected[0], date(2024, 3, 3));
    }

    #[test]
    fn test_max_composite_ignores_nodata() {
        let grid = test_grid();
        let mut series = GridSeries::new("dhw", grid);

        let mut first = Raster::filled(grid, 5.0);
        first.clear(0);
        let mut second = Raster::filled(grid, 3.0);
        second.clear(1);

        series.insert(date(2024, 1, 1), first).unwrap();
        series.insert(date(2024, 1, 2), second).unwrap();

        let composite = series.max_composite().unwrap().unwrap();
        assert_eq!(composite.get(0), Some(3.0));
        assert_eq!(composite.get(1), Some(5.0));
        assert_eq!(composite.get(2), Some(5.0));
    }

    #[test]
    fn test_max_composite_empty_series() {
        let series = GridSeries::new("dhw", test_grid());
        assert!(series.max_composite().unwrap().is_none());
    }
}
