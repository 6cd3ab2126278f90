//! Configuration management for Floodgate.

use serde::{Deserialize, Serialize};

use crate::error::{FloodgateError, Result};
use crate::throttle::PolicyTable;

/// Main configuration for an embedded throttle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Throttling configuration
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

impl Default for FloodgateConfig {
    fn default() -> Self {
        Self {
            throttle: ThrottleConfig::default(),
        }
    }
}

/// Throttling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Path to a named policy table file (YAML or JSON)
    pub policy_path: Option<String>,

    /// Interval between expired-window sweeps, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            policy_path: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

impl ThrottleConfig {
    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }

    /// Resolve the policy table: built-in defaults overlaid with the
    /// configured file, if one is set.
    pub fn load_policies(&self) -> Result<PolicyTable> {
        let table = PolicyTable::new();
        match &self.policy_path {
            Some(path) => Ok(table.with_overrides(PolicyTable::from_file(path)?)),
            None => Ok(table),
        }
    }
}

impl FloodgateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: FloodgateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| FloodgateError::Config(e.to_string()))?;
        Ok(config)
    }
}
