//! Configuration for the climatology baseline.

use serde::{Deserialize, Serialize};

/// Configuration for climatology estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimatologyConfig {
    /// First year of the baseline window, inclusive.
    pub baseline_start: i32,

    /// Last year of the baseline window, inclusive.
    pub baseline_end: i32,

    /// Reference year the monthly regressions are evaluated at.
    ///
    /// Fractional years are meaningful: the satellite-era default re-centers
    /// the climatology on mid-April 1988 per the NOAA Coral Reef Watch
    /// methodology. The reference year need not lie inside the baseline
    /// window.
    pub reference_year: f64,
}

impl Default for ClimatologyConfig {
    fn default() -> Self {
        Self {
            baseline_start: 1985,
            baseline_end: 2012,
            reference_year: 1988.2857,
        }
    }
}

impl ClimatologyConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables onto an existing configuration.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("BASELINE_START_YEAR") {
            if let Ok(year) = val.parse() {
                self.baseline_start = year;
            }
        }

        if let Ok(val) = std::env::var("BASELINE_END_YEAR") {
            if let Ok(year) = val.parse() {
                self.baseline_end = year;
            }
        }

        if let Ok(val) = std::env::var("REFERENCE_YEAR") {
            if let Ok(year) = val.parse() {
                self.reference_year = year;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.baseline_start > self.baseline_end {
            return Err(format!(
                "baseline_start {} is after baseline_end {}",
                self.baseline_start, self.baseline_end
            ));
        }

        if self.baseline_end - self.baseline_start + 1 < 2 {
            return Err("baseline window must span at least 2 years".to_string());
        }

        if !self.reference_year.is_finite() {
            return Err("reference_year must be finite".to_string());
        }

        Ok(())
    }

    /// Iterate the baseline years in order.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.baseline_start..=self.baseline_end
    }
}
