//! Bleaching alert levels derived from Degree Heating Weeks.

use serde::{Deserialize, Serialize};

use reef_common::Raster;

/// DHW at which significant coral bleaching becomes likely.
pub const WARNING_DHW: f32 = 4.0;

/// DHW at which widespread bleaching and significant mortality are
/// expected.
pub const ALERT_DHW: f32 = 8.0;

/// Stress level for a cell, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    NoStress,
    Warning,
    Alert,
}

impl AlertLevel {
    /// Classify a DHW value. Thresholds are inclusive.
    pub fn from_dhw(dhw: f32) -> Self {
        if dhw >= ALERT_DHW {
            AlertLevel::Alert
        } else if dhw >= WARNING_DHW {
            AlertLevel::Warning
        } else {
            AlertLevel::NoStress
        }
    }
}

/// Binary mask of cells at or above `threshold` degree-weeks.
///
/// Valid cells become 1.0 or 0.0; no-data stays no-data.
pub fn exceedance_mask(dhw: &Raster, threshold: f32) -> Raster {
    dhw.map(|v| if v >= threshold { 1.0 } else { 0.0 })
}

/// Cell tally of a DHW raster by alert level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub no_stress: usize,
    pub warning: usize,
    pub alert: usize,
    pub no_data: usize,
}

/// Count cells at each alert level.
pub fn alert_counts(dhw: &Raster) -> AlertCounts {
    let mut counts = AlertCounts::default();
    for cell in dhw.iter() {
        match cell.map(AlertLevel::from_dhw) {
            None => counts.no_data += 1,
            Some(AlertLevel::NoStress) => counts.no_stress += 1,
            Some(AlertLevel::Warning) => counts.warning += 1,
            Some(AlertLevel::Alert) => counts.alert += 1,
        }
    }
    counts
}
