//! Configuration for Degree Heating Weeks accumulation.

use serde::{Deserialize, Serialize};

/// Configuration for the DHW accumulation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DhwConfig {
    /// Length of the accumulation window in days.
    pub window_days: usize,

    /// Minimum HotSpot, in degrees Celsius, that contributes to the
    /// accumulation. HotSpots below this floor count as zero stress.
    pub hotspot_threshold: f32,
}

impl Default for DhwConfig {
    fn default() -> Self {
        Self {
            window_days: 84,
            hotspot_threshold: 1.0,
        }
    }
}

impl DhwConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables onto an existing configuration.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("DHW_WINDOW_DAYS") {
            if let Ok(days) = val.parse() {
                self.window_days = days;
            }
        }

        if let Ok(val) = std::env::var("DHW_HOTSPOT_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                self.hotspot_threshold = threshold;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.window_days == 0 {
            return Err("window_days must be at least 1".to_string());
        }

        if !self.hotspot_threshold.is_finite() || self.hotspot_threshold < 0.0 {
            return Err(format!(
                "hotspot_threshold must be non-negative, got {}",
                self.hotspot_threshold
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_operational_product() {
        let config = DhwConfig::default();
        assert_eq!(config.window_days, 84);
        assert_eq!(config.hotspot_threshold, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        let config = DhwConfig {
            window_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let config = DhwConfig {
            hotspot_threshold: -0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
