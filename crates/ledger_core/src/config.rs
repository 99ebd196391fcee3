//! Engine configuration.
//!
//! Loaded from RON, e.g.:
//!
//! ```ron
//! EngineConfig(
//!     tick_rate: 20.0,
//!     aggregation_mode: ExternalTotals,
//!     log_status: true,
//! )
//! ```
//!
//! All fields are optional and fall back to [`EngineConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capacity::AggregationMode;
use crate::clock::DEFAULT_TICK_RATE;
use crate::error::{EngineError, Result};

/// Settings for a [`ProductionScheduler`](crate::scheduler::ProductionScheduler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Allocation passes per second of simulation time.
    pub tick_rate: f64,
    /// Capacity strategy for the aggregation phase.
    pub aggregation_mode: AggregationMode,
    /// Log the resource-status snapshot after every pass.
    pub log_status: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            aggregation_mode: AggregationMode::ProducerSum,
            log_status: false,
        }
    }
}

impl EngineConfig {
    /// Parse a config from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Reject values the engine cannot run with.
    ///
    /// A zero or negative tick rate is valid (one pass per call); NaN and
    /// infinities are not.
    pub fn validate(&self) -> Result<()> {
        if !self.tick_rate.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "tick_rate must be finite, got {}",
                self.tick_rate
            )));
        }
        Ok(())
    }
}
