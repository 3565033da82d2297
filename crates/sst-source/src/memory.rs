//! In-memory SST source for tests and composition.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use reef_common::{BoundingBox, DateRange, Grid, GridSeries, Raster, ReefError};

use crate::error::{Result, SourceError};
use crate::source::SstSource;
use crate::window::{crop, window_for_bbox};

/// An [`SstSource`] backed by a map of rasters.
pub struct InMemorySource {
    variable: String,
    grid: Grid,
    days: BTreeMap<NaiveDate, Raster>,
}

impl InMemorySource {
    pub fn new(variable: impl Into<String>, grid: Grid) -> Self {
        Self {
            variable: variable.into(),
            grid,
            days: BTreeMap::new(),
        }
    }

    /// Build a source serving the entries of an existing series.
    pub fn from_series(series: &GridSeries) -> Self {
        let mut source = Self::new(series.variable(), *series.grid());
        for entry in series.iter() {
            source.days.insert(entry.date, entry.raster.clone());
        }
        source
    }

    /// Add one day of data. Replaces any raster already held for the date.
    pub fn insert(&mut self, date: NaiveDate, raster: Raster) -> Result<()> {
        if *raster.grid() != self.grid {
            return Err(ReefError::grid_mismatch(&self.grid, raster.grid()).into());
        }
        self.days.insert(date, raster);
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

#[async_trait]
impl SstSource for InMemorySource {
    fn variable(&self) -> &str {
        &self.variable
    }

    async fn fetch(&self, bbox: &BoundingBox, range: DateRange) -> Result<GridSeries> {
        let window = window_for_bbox(&self.grid, bbox).ok_or_else(|| {
            SourceError::out_of_bounds(format!("{:?}", bbox), format!("{:?}", self.grid.bbox))
        })?;

        let mut series = GridSeries::new(self.variable.clone(), window.grid);
        for (date, raster) in self.days.range(range.start..=range.end) {
            series.insert(*date, crop(raster, &window))?;
        }
        Ok(series)
    }

    async fn has_data(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.days.contains_key(&date))
    }
}
