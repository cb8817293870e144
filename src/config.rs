//! Stabilizer configuration
//!
//! Loaded from JSON by the host (usually alongside the tablet settings) and
//! validated before a sampler is built from it.

use crate::error::{Result, StabilizerError};
use serde::{Deserialize, Serialize};

/// Configuration for the stabilized events sampler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Output cadence in milliseconds (must be > 0)
    pub sample_interval_ms: i64,
    /// Extra time the tail sample is stretched over when a stroke ends
    pub finishing_delay_ms: i64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            // 200 Hz, matching the default tablet polling rate
            sample_interval_ms: 5,
            finishing_delay_ms: 0,
        }
    }
}

impl StabilizerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration invariants
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_ms <= 0 {
            return Err(StabilizerError::InvalidConfiguration(format!(
                "sample interval must be > 0 ms, got {}",
                self.sample_interval_ms
            )));
        }
        if self.finishing_delay_ms < 0 {
            return Err(StabilizerError::InvalidConfiguration(format!(
                "finishing delay must be >= 0 ms, got {}",
                self.finishing_delay_ms
            )));
        }
        Ok(())
    }
}
