//! Discovery and call settings.
//!
//! Loaded from an optional YAML file. Every field has a default, so an empty
//! document or a partial one is valid.
//!
//! # Example YAML
//!
//! ```yaml
//! max_depth: 2
//! prebuild_depth: 3
//! batch_size: 8
//! help_flag: "--help"
//! help_timeout_ms: 5000
//! progress_interval: 10
//! call_timeout_ms: 60000
//! ```

use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for discovery runs and tool calls.
///
/// # Examples
///
/// ```
/// use command_tools_discovery::DiscoveryConfig;
///
/// let config: DiscoveryConfig = serde_yaml::from_str("batch_size: 4").unwrap();
/// assert_eq!(config.batch_size, 4);
/// assert_eq!(config.max_depth, 1);
/// assert_eq!(config.help_flag, "--help");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Depth for interactive discovery.
    pub max_depth: usize,
    /// Depth for pre-built snapshots.
    pub prebuild_depth: usize,
    /// Children expanded per batch and worker threads in the pool.
    pub batch_size: usize,
    /// Flag appended to every help acquisition.
    pub help_flag: String,
    pub help_timeout_ms: u64,
    /// Log a progress event every this many discovered nodes.
    pub progress_interval: usize,
    pub call_timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            prebuild_depth: 3,
            batch_size: 20,
            help_flag: "--help".to_string(),
            help_timeout_ms: 10_000,
            progress_interval: 10,
            call_timeout_ms: 60_000,
        }
    }
}

impl DiscoveryConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if parsing fails, or [`ConfigError::Invalid`] if
    /// a value is out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        // An empty document deserializes to unit, not a mapping.
        let value: serde_yaml::Value = serde_yaml::from_reader(reader)?;
        let config = if value.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(value)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would stall or disable discovery.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".to_string()));
        }
        if self.help_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "help_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "call_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.help_flag.trim().is_empty() {
            return Err(ConfigError::Invalid("help_flag must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn help_timeout(&self) -> Duration {
        Duration::from_millis(self.help_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}
