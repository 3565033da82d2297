//! Layout of the export tree.
//!
//! Product rasters live at `{prefix}/{product}/{year}/{YYYYMMDD}`, one
//! Zarr array per product per day. Baseline arrays live under
//! `{prefix}/baseline/`. The prefix is empty for a store rooted at the
//! dataset, or a leading-slash path inside a shared bucket.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use walkdir::WalkDir;

use reef_common::time::compact_date;

use crate::error::{ExportError, Result};

/// Zarr node path for one product raster.
pub fn raster_path(prefix: &str, product: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/{:04}/{}",
        prefix,
        product,
        date.year(),
        compact_date(date)
    )
}

/// Zarr node path for a flat dataset name (band stacks, baseline assets).
pub fn flat_path(prefix: &str, name: &str) -> String {
    format!("{}/{}", prefix, name)
}

/// Dates with an exported raster for `product` under a filesystem root.
///
/// Scans `{root}/{product}/{year}/{YYYYMMDD}` directories that hold Zarr
/// metadata; anything else in the tree is ignored. Returned sorted.
pub fn filesystem_inventory(root: &Path, product: &str) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::new();
    let product_dir = root.join(product);
    if !product_dir.is_dir() {
        return Ok(dates);
    }

    for entry in WalkDir::new(&product_dir).min_depth(2).max_depth(2) {
        let entry = entry.map_err(|e| ExportError::read_failed(e.to_string()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if !entry.path().join("zarr.json").is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if let Ok(date) = NaiveDate::parse_from_str(name, "%Y%m%d") {
                dates.push(date);
            }
        }
    }

    dates.sort();
    Ok(dates)
}
