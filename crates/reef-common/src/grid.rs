//! Raster grid identity shared by every raster in the pipeline.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// A regular lat/lon grid over a bounding box.
///
/// Every raster and series in the pipeline is defined over exactly one grid;
/// combining rasters over different grids is a wiring bug and fails loudly.
/// Rows run north to south: row 0 touches `max_lat`, the last row touches
/// `min_lat`. Data is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Geographic extent of the grid.
    pub bbox: BoundingBox,
    /// Number of columns (longitude direction).
    pub width: usize,
    /// Number of rows (latitude direction).
    pub height: usize,
}

impl Grid {
    /// Create a grid with explicit dimensions.
    pub fn new(bbox: BoundingBox, width: usize, height: usize) -> Self {
        Self {
            bbox,
            width,
            height,
        }
    }

    /// Create a grid covering `bbox` at a fixed cell size in degrees.
    ///
    /// Dimensions are rounded up so the grid always covers the full extent.
    pub fn with_resolution(bbox: BoundingBox, resolution_deg: f64) -> Self {
        let width = (bbox.width() / resolution_deg).ceil().max(1.0) as usize;
        let height = (bbox.height() / resolution_deg).ceil().max(1.0) as usize;
        Self {
            bbox,
            width,
            height,
        }
    }

    /// Cell size in degrees as (lon_per_cell, lat_per_cell).
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.bbox.width() / self.width as f64,
            self.bbox.height() / self.height as f64,
        )
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Flat row-major index for a (col, row) position.
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    /// Center coordinates of a cell as (lon, lat).
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let (res_lon, res_lat) = self.resolution();
        (
            self.bbox.min_lon + (col as f64 + 0.5) * res_lon,
            self.bbox.max_lat - (row as f64 + 0.5) * res_lat,
        )
    }

    /// Convert coordinates to the containing cell, or `None` outside the grid.
    pub fn cell_at(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !self.bbox.contains(lon, lat) {
            return None;
        }

        let (res_lon, res_lat) = self.resolution();
        let col = (((lon - self.bbox.min_lon) / res_lon).floor() as usize).min(self.width - 1);
        let row = (((self.bbox.max_lat - lat) / res_lat).floor() as usize).min(self.height - 1);
        Some((col, row))
    }

    /// Short human-readable description used in mismatch errors.
    pub fn describe(&self) -> String {
        format!(
            "{}x{} [{:.4},{:.4},{:.4},{:.4}]",
            self.width,
            self.height,
            self.bbox.min_lon,
            self.bbox.min_lat,
            self.bbox.max_lon,
            self.bbox.max_lat
        )
    }
}

/// Common grid definitions for reef analysis products.
pub mod grids {
    use super::*;
    use crate::bbox::regions;

    /// Great Barrier Reef region at the 0.25 degree satellite SST resolution.
    pub fn gbr_quarter_degree() -> Grid {
        Grid::with_resolution(regions::great_barrier_reef(), 0.25)
    }
}
