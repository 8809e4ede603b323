use std::path::{Path, PathBuf};
use std::fs;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proxy::DEFAULT_QUEUE_DEPTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not determine config file path")]
    NoConfigDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Namespace of the proxy's topics and services.
    pub node_name: String,
    pub node_id: u8,
    pub queue_depth: usize,
    /// `env_logger` filter, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Period of the simulated device's TPDO broadcast.
    pub tpdo_interval_ms: u64,
    /// Simulated SDO round-trip time.
    pub sdo_latency_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            node_name: "proxy_device".to_string(),
            node_id: 1,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            log_level: "info".to_string(),
            tpdo_interval_ms: 100,
            sdo_latency_ms: 0,
        }
    }
}

impl ProxyConfig {
    /// Get the path to the default config file
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "canopen", "canopen-proxy-driver")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration from `path`, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                warn!("{}, using default configuration", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save to the default config file location
    pub fn save_default_location(&self) -> Result<(), ConfigError> {
        let path = Self::config_file_path().ok_or(ConfigError::NoConfigDirectory)?;
        self.save(&path)
    }
}
