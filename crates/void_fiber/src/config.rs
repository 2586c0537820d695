//! Renderer configuration
//!
//! ```toml
//! [scheduler]
//! slice_budget_ms = 8.0
//! continuation = "timer"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use void_scheduler::SchedulerConfig;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Renderer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Scheduler settings
    pub scheduler: SchedulerConfig,
}

impl RendererConfig {
    /// Set the scheduler config
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Parse from a TOML string
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let budget = self.scheduler.slice_budget_ms;
        if !budget.is_finite() || budget < 0.0 {
            return Err(ConfigError::Invalid {
                field: "scheduler.slice_budget_ms",
                reason: format!("expected a non-negative number of milliseconds, got {budget}"),
            });
        }
        Ok(())
    }
}
