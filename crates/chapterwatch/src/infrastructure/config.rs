use std::path::{Path, PathBuf};
use std::time::Duration;

use chapterwatch_lib::prelude::TrackingType;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_STATE_PATH: &str = "state.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0:?} not found")]
    NotFound(PathBuf),
    #[error("failed to read config {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config {0:?}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("no webhook_url in config")]
    MissingWebhookUrl,
    #[error("numbering should be number or id")]
    InvalidNumbering,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    pub url: String,
    #[serde(default = "default_alias")]
    pub alias: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    /// Which chapter numbering the source tracks
    #[serde(default = "default_numbering")]
    pub numbering: TrackingType,
    #[serde(default = "default_notify_delay_ms")]
    pub notify_delay_ms: u64,
    #[serde(default = "default_series_delay_ms")]
    pub series_delay_ms: u64,
}

fn default_alias() -> String {
    "Unknown Series".to_string()
}

fn default_numbering() -> TrackingType {
    TrackingType::Number
}

fn default_notify_delay_ms() -> u64 {
    1000
}

fn default_series_delay_ms() -> u64 {
    2000
}

impl Config {
    /// Load and validate the config. Unlike the state file, a missing or
    /// broken config is fatal.
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
        let config_path = match path {
            Some(p) => PathBuf::new().join(p),
            None => PathBuf::from(DEFAULT_CONFIG_PATH),
        };

        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }

        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::Io(config_path.clone(), e))?;
        let mut cfg: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(config_path.clone(), e))?;
        cfg.path = config_path;
        cfg.validate()?;

        info!("open config from {:?}", cfg.path);

        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook_url.trim().is_empty() {
            return Err(ConfigError::MissingWebhookUrl);
        }
        if !self.numbering.is_known() {
            return Err(ConfigError::InvalidNumbering);
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn notify_delay(&self) -> Duration {
        Duration::from_millis(self.notify_delay_ms)
    }

    pub fn series_delay(&self) -> Duration {
        Duration::from_millis(self.series_delay_ms)
    }
}
