//! Single-band raster with an explicit per-cell validity bitmap.

use crate::error::{ReefError, ReefResult};
use crate::Grid;

/// One scalar value per grid cell, with per-cell no-data tracked in a
/// separate validity bitmap.
///
/// No-data is never encoded as a sentinel value inside the engine; NaN
/// appears only at the storage boundary, where [`Raster::from_nan_values`]
/// and [`Raster::nan_encoded`] translate to and from the bitmap. The value
/// slot of an invalid cell is unspecified and must not be read directly.
#[derive(Debug, Clone)]
pub struct Raster {
    grid: Grid,
    values: Vec<f32>,
    valid: Vec<bool>,
}

impl Raster {
    /// Create a raster with every cell marked no-data.
    pub fn nodata(grid: Grid) -> Self {
        let n = grid.len();
        Self {
            grid,
            values: vec![0.0; n],
            valid: vec![false; n],
        }
    }

    /// Create a raster with every cell set to `value`.
    pub fn filled(grid: Grid, value: f32) -> Self {
        let n = grid.len();
        Self {
            grid,
            values: vec![value; n],
            valid: vec![true; n],
        }
    }

    /// Create a raster from parallel value and validity buffers.
    pub fn from_values(grid: Grid, values: Vec<f32>, valid: Vec<bool>) -> ReefResult<Self> {
        if values.len() != grid.len() {
            return Err(ReefError::ShapeMismatch {
                expected: grid.len(),
                actual: values.len(),
            });
        }
        if valid.len() != grid.len() {
            return Err(ReefError::ShapeMismatch {
                expected: grid.len(),
                actual: valid.len(),
            });
        }
        Ok(Self { grid, values, valid })
    }

    /// Create a raster from per-cell options (`None` = no-data).
    pub fn from_options(grid: Grid, cells: &[Option<f32>]) -> ReefResult<Self> {
        if cells.len() != grid.len() {
            return Err(ReefError::ShapeMismatch {
                expected: grid.len(),
                actual: cells.len(),
            });
        }
        let mut raster = Raster::nodata(grid);
        for (idx, cell) in cells.iter().enumerate() {
            if let Some(v) = cell {
                raster.set(idx, *v);
            }
        }
        Ok(raster)
    }

    /// Decode a NaN-encoded buffer from the storage boundary.
    ///
    /// Non-finite values become no-data cells.
    pub fn from_nan_values(grid: Grid, values: Vec<f32>) -> ReefResult<Self> {
        if values.len() != grid.len() {
            return Err(ReefError::ShapeMismatch {
                expected: grid.len(),
                actual: values.len(),
            });
        }
        let valid: Vec<bool> = values.iter().map(|v| v.is_finite()).collect();
        Ok(Self { grid, values, valid })
    }

    /// The grid this raster is defined over.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the raster has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a flat index, or `None` for no-data.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<f32> {
        if self.valid.get(idx).copied().unwrap_or(false) {
            Some(self.values[idx])
        } else {
            None
        }
    }

    /// Value at a (col, row) position, or `None` for no-data.
    #[inline]
    pub fn get_at(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.grid.width || row >= self.grid.height {
            return None;
        }
        self.get(self.grid.index(col, row))
    }

    /// Set a cell to a valid value.
    #[inline]
    pub fn set(&mut self, idx: usize, value: f32) {
        self.values[idx] = value;
        self.valid[idx] = true;
    }

    /// Mark a cell as no-data.
    #[inline]
    pub fn clear(&mut self, idx: usize) {
        self.values[idx] = 0.0;
        self.valid[idx] = false;
    }

    /// Check whether a cell holds a valid value.
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        self.valid.get(idx).copied().unwrap_or(false)
    }

    /// Raw value buffer. Invalid cells hold unspecified values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Raw validity bitmap.
    pub fn validity(&self) -> &[bool] {
        &self.valid
    }

    /// Number of valid cells.
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }

    /// Iterate cells in row-major order as options.
    pub fn iter(&self) -> impl Iterator<Item = Option<f32>> + '_ {
        self.values
            .iter()
            .zip(self.valid.iter())
            .map(|(v, ok)| if *ok { Some(*v) } else { None })
    }

    /// Apply `f` to every valid cell; no-data cells stay no-data.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Raster {
        let mut out = Raster::nodata(self.grid);
        for idx in 0..self.len() {
            if self.valid[idx] {
                out.set(idx, f(self.values[idx]));
            }
        }
        out
    }

    /// Combine two rasters cell by cell.
    ///
    /// No-data on either side propagates to the output. Fails with
    /// [`ReefError::GridMismatch`] when the grids differ.
    pub fn zip_map(&self, other: &Raster, f: impl Fn(f32, f32) -> f32) -> ReefResult<Raster> {
        self.check_same_grid(other)?;

        let mut out = Raster::nodata(self.grid);
        for idx in 0..self.len() {
            if self.valid[idx] && other.valid[idx] {
                out.set(idx, f(self.values[idx], other.values[idx]));
            }
        }
        Ok(out)
    }

    /// Fold another raster into this one taking the per-cell maximum.
    ///
    /// No-data is ignored rather than propagated: a valid value on either
    /// side wins over no-data, and a cell stays no-data only when both sides
    /// are no-data.
    pub fn merge_max(&mut self, other: &Raster) -> ReefResult<()> {
        self.check_same_grid(other)?;

        for idx in 0..self.values.len() {
            if let Some(v) = other.get(idx) {
                match self.get(idx) {
                    Some(current) if current >= v => {}
                    _ => self.set(idx, v),
                }
            }
        }
        Ok(())
    }

    /// Encode for the storage boundary: valid values as-is, no-data as NaN.
    pub fn nan_encoded(&self) -> Vec<f32> {
        self.values
            .iter()
            .zip(self.valid.iter())
            .map(|(v, ok)| if *ok { *v } else { f32::NAN })
            .collect()
    }

    /// Verify another raster shares this raster's grid.
    pub fn check_same_grid(&self, other: &Raster) -> ReefResult<()> {
        if self.grid != other.grid {
            return Err(ReefError::grid_mismatch(&self.grid, &other.grid));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;

    fn test_grid() -> Grid {
        Grid::new(BoundingBox::new(0.0, 0.0, 4.0, 3.0), 4, 3)
    }

    #[test]
    fn test_nodata_raster_is_all_invalid() {
        let raster = Raster::nodata(test_grid());
        assert_eq!(raster.len(), 12);
        assert_eq!(raster.valid_count(), 0);
        assert_eq!(raster.get(0), None);
    }

    #[test]
    fn test_set_and_clear() {
        let mut raster = Raster::nodata(test_grid());
        raster.set(5, 26.5);
        assert_eq!(raster.get(5), Some(26.5));
        assert_eq!(raster.valid_count(), 1);

        raster.clear(5);
        assert_eq!(raster.get(5), None);
        assert_eq!(raster.valid_count(), 0);
    }

    #[test]
    fn test_from_values_rejects_wrong_shape() {
        let result = Raster::from_values(test_grid(), vec![1.0; 5], vec![true; 5]);
        assert!(matches!(result, Err(ReefError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_zip_map_propagates_nodata() {
        let grid = test_grid();
        let mut a = Raster::filled(grid, 10.0);
        let b = Raster::filled(grid, 4.0);
        a.clear(3);

        let diff = a.zip_map(&b, |x, y| x - y).unwrap();
        assert_eq!(diff.get(0), Some(6.0));
        assert_eq!(diff.get(3), None);
    }

    #[test]
    fn test_zip_map_rejects_grid_mismatch() {
        let a = Raster::filled(test_grid(), 1.0);
        let other_grid = Grid::new(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 2, 2);
        let b = Raster::filled(other_grid, 1.0);

        assert!(matches!(
            a.zip_map(&b, |x, _| x),
            Err(ReefError::GridMismatch { .. })
        ));
    }

    #[test]
    fn test_merge_max_ignores_nodata() {
        let grid = test_grid();
        let mut acc = Raster::nodata(grid);
        let mut january = Raster::filled(grid, 24.0);
        january.clear(2);
        let mut february = Raster::filled(grid, 26.0);
        february.clear(7);

        acc.merge_max(&january).unwrap();
        acc.merge_max(&february).unwrap();

        assert_eq!(acc.get(0), Some(26.0));
        // Cell 2 only had a February value, cell 7 only a January value.
        assert_eq!(acc.get(2), Some(26.0));
        assert_eq!(acc.get(7), Some(24.0));
    }

    #[test]
    fn test_nan_boundary_round_trip() {
        let grid = test_grid();
        let mut raster = Raster::filled(grid, 27.25);
        raster.clear(1);

        let encoded = raster.nan_encoded();
        assert!(encoded[1].is_nan());
        assert_eq!(encoded[0], 27.25);

        let decoded = Raster::from_nan_values(grid, encoded).unwrap();
        assert_eq!(decoded.get(0), Some(27.25));
        assert_eq!(decoded.get(1), None);
    }
}
