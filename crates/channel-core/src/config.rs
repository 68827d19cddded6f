//! Engine configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! [registry]
//! channel_type = "linear"
//! max_channels = 1000
//! map_buckets = 1024
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use serde::{Deserialize, Serialize};

use crate::channel::ChannelType;
use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::map::DEFAULT_BUCKETS;

/// Registry sizing and the channel type it validates against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub channel_type: ChannelType,

    /// Most channels one registry may hold
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,

    /// Hash chains per channel map
    #[serde(default = "default_map_buckets")]
    pub map_buckets: usize,
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_channels() -> usize {
    1000
}

fn default_map_buckets() -> usize {
    DEFAULT_BUCKETS
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            channel_type: ChannelType::default(),
            max_channels: default_max_channels(),
            map_buckets: default_map_buckets(),
        }
    }
}

impl RegistryConfig {
    pub fn with_channel_type(mut self, channel_type: ChannelType) -> Self {
        self.channel_type = channel_type;
        self
    }

    pub fn with_max_channels(mut self, max_channels: usize) -> Self {
        self.max_channels = max_channels;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_channels == 0 {
            return Err(ConfigError::InvalidSetting("max_channels must be at least 1".to_string()));
        }
        if self.map_buckets == 0 {
            return Err(ConfigError::InvalidSetting("map_buckets must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.registry.validate()?;
        self.logging.level()?;
        Ok(())
    }
}
