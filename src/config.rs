//! Level configuration
//!
//! Loaded from JSON by hosts that ship level files; everything falls back to
//! the default field when absent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse level config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("field size must be positive and finite, got {size_x} x {size_y}")]
    InvalidFieldSize { size_x: f32, size_y: f32 },
}

/// Static description of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Field width in field units (centered on 0)
    pub size_x: f32,
    /// Field depth in field units (centered on 0)
    pub size_y: f32,
    /// Seed for every random choice the level makes
    pub seed: u64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            size_x: 24.0,
            size_y: 16.0,
            seed: 0,
        }
    }
}

impl LevelConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if ok(self.size_x) && ok(self.size_y) {
            Ok(())
        } else {
            Err(ConfigError::InvalidFieldSize {
                size_x: self.size_x,
                size_y: self.size_y,
            })
        }
    }
}
