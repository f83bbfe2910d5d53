use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clipboard::monitor::POLL_INTERVAL_MS;
use crate::error::{ClipdeckError, Result};
use crate::storage::database::DEFAULT_HISTORY_LIMIT;

/// Directory name under the platform data/config dirs.
/// Override at build time: CLIPDECK_APP_NAME=clipdeck-dev cargo build
pub const APP_NAME: &str = match option_env!("CLIPDECK_APP_NAME") {
    Some(name) => name,
    None => "clipdeck",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll_interval_ms: u64,
    /// Non-favorite entries kept. 0 keeps everything.
    pub history_limit: u32,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        Self::from_toml(&raw)
            .map_err(|e| ClipdeckError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| ClipdeckError::Config(e.to_string()))?;
        if config.poll_interval_ms == 0 {
            return Err(ClipdeckError::Config(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join("config.toml"))
}
