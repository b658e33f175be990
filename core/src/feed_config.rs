use std::path::Path;
use std::path::PathBuf;

use derive_more::From;
use log::LevelFilter;
use once_cell::sync;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_FEED_CONFIG_FILE_NAME: &str = "box_feed_config.yaml";

pub static FEED_CONFIG_FILE_PATH: sync::OnceCell<PathBuf> = sync::OnceCell::new();

/// Config loaded from [`FEED_CONFIG_FILE_PATH`] (or the default file name when unset).
pub static FEED_CONFIG_OPT: Lazy<Result<FeedConfig, String>> = Lazy::new(|| {
    let path = FEED_CONFIG_FILE_PATH
        .get()
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FEED_CONFIG_FILE_NAME));
    FeedConfig::load(&path).map_err(|e| e.to_string())
});

#[derive(Debug, From, Error)]
pub enum FeedConfigError {
    #[error("config file io error: {0}")]
    Io(std::io::Error),
    #[error("config file yaml error: {0}")]
    Yaml(serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub page_size: usize,
    /// Shown instead of rows while the view is empty.
    pub empty_placeholder: String,
    pub queue_capacity: usize,
    pub log_level: Option<LevelFilter>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            page_size: 20,
            empty_placeholder: "No transactions yet".to_string(),
            queue_capacity: 64,
            log_level: None,
        }
    }
}

impl FeedConfig {
    /// A missing file yields the default config.
    pub fn load(path: &Path) -> Result<Self, FeedConfigError> {
        if !path.exists() {
            log::debug!("{} not found, using default config", path.display());
            return Ok(FeedConfig::default());
        }
        Self::load_from_str(&std::fs::read_to_string(path)?)
    }

    pub fn load_from_str(config_str: &str) -> Result<FeedConfig, FeedConfigError> {
        Ok(serde_yaml::from_str(config_str)?)
    }

    pub fn write_default_config_file(path: &Path) -> Result<(), FeedConfigError> {
        let yaml_str = serde_yaml::to_string(&FeedConfig::default())?;
        std::fs::write(path, yaml_str)?;
        Ok(())
    }
}
