//! Application configuration

use crate::location::CascadeConfig;
use crate::viewport::CameraState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

const CONFIG_FILE: &str = "trashmap.json";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config schema version
    pub version: u32,

    /// Data directory path
    pub data_dir: PathBuf,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Base URL of the demo auth/profile API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Optional path to a seed marker document; the embedded default is
    /// used when unset
    #[serde(default)]
    pub seed_path: Option<PathBuf>,

    /// Camera the map opens with
    #[serde(default)]
    pub default_camera: CameraState,

    /// Location cascade timing overrides
    #[serde(default)]
    pub cascade: CascadeConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base_url() -> String {
    "https://dummyjson.com".to_string()
}

impl AppConfig {
    const VERSION: u32 = 1;

    /// Load configuration from a data directory, writing defaults when no
    /// config exists yet.
    pub fn load_or_create(data_dir: &PathBuf) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);

        if config_path.exists() {
            info!("Loading config from {:?}", config_path);
            let json = fs::read_to_string(&config_path)?;
            let config: AppConfig = serde_json::from_str(&json)?;
            Ok(config)
        } else {
            warn!("No config found, creating default at {:?}", config_path);
            let config = Self::default_with_dir(data_dir.clone());
            config.save()?;
            Ok(config)
        }
    }

    /// Create default configuration with specific data directory
    pub fn default_with_dir(data_dir: PathBuf) -> Self {
        Self {
            version: Self::VERSION,
            data_dir,
            log_level: default_log_level(),
            api_base_url: default_api_base_url(),
            seed_path: None,
            default_camera: CameraState::default(),
            cascade: CascadeConfig::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        let config_path = self.data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, json)?;
        info!("Saved config to {:?}", config_path);
        Ok(())
    }
}
