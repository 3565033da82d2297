//! Configuration for Zarr export.

use serde::{Deserialize, Serialize};

/// Configuration for exported array chunking and compression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Chunk edge length for exported arrays.
    pub chunk_size: usize,

    /// Blosc zstd compression level, 0-9.
    pub compression_level: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            compression_level: 5,
        }
    }
}

impl ExportConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables onto an existing configuration.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("EXPORT_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                self.chunk_size = size;
            }
        }

        if let Ok(val) = std::env::var("EXPORT_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                self.compression_level = level;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be at least 1".to_string());
        }

        if self.compression_level > 9 {
            return Err(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            ));
        }

        Ok(())
    }
}
