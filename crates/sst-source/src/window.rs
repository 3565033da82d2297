//! Cell-aligned windows of a source grid.

use reef_common::{BoundingBox, Grid, Raster};

/// The cells of a source grid covered by a requested bounding box.
///
/// `grid` is the cropped grid, snapped outward to cell edges, so the window
/// always covers the full request where the source does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellWindow {
    pub start_col: usize,
    pub start_row: usize,
    pub grid: Grid,
}

/// Compute the window of `source` covered by `bbox`.
///
/// Returns `None` when the request does not intersect the source grid.
pub fn window_for_bbox(source: &Grid, bbox: &BoundingBox) -> Option<CellWindow> {
    let (res_x, res_y) = source.resolution();
    let sb = source.bbox;

    let min_col = ((bbox.min_lon - sb.min_lon) / res_x).floor().max(0.0) as usize;
    let max_col = ((bbox.max_lon - sb.min_lon) / res_x)
        .ceil()
        .min(source.width as f64) as usize;
    let min_row = ((sb.max_lat - bbox.max_lat) / res_y).floor().max(0.0) as usize;
    let max_row = ((sb.max_lat - bbox.min_lat) / res_y)
        .ceil()
        .min(source.height as f64) as usize;

    if min_col >= max_col || min_row >= max_row {
        return None;
    }

    let aligned = BoundingBox::new(
        sb.min_lon + min_col as f64 * res_x,
        sb.max_lat - max_row as f64 * res_y,
        sb.min_lon + max_col as f64 * res_x,
        sb.max_lat - min_row as f64 * res_y,
    );

    Some(CellWindow {
        start_col: min_col,
        start_row: min_row,
        grid: Grid::new(aligned, max_col - min_col, max_row - min_row),
    })
}

/// Copy a window out of a full-grid raster.
pub fn crop(raster: &Raster, window: &CellWindow) -> Raster {
    let mut out = Raster::nodata(window.grid);
    for row in 0..window.grid.height {
        for col in 0..window.grid.width {
            if let Some(v) = raster.get_at(window.start_col + col, window.start_row + row) {
                out.set(window.grid.index(col, row), v);
            }
        }
    }
    out
}
