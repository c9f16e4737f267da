//! Client configuration file.
//!
//! Stored as JSON at `<config_dir>/scanflow/client.json`. A missing file
//! yields the defaults. Environment variables and command-line flags are
//! layered on top at startup and never written back.
//!
//! | Env Var               | Overrides      |
//! |-----------------------|----------------|
//! | `SCANFLOW_SERVER_URL` | `server.url`   |
//! | `SCANFLOW_API_KEY`    | `server.api_key` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const ENV_SERVER_URL: &str = "SCANFLOW_SERVER_URL";
pub const ENV_API_KEY: &str = "SCANFLOW_API_KEY";

const CONFIG_DIR: &str = "scanflow";
const CONFIG_FILE: &str = "client.json";

/// Lower bound for the dashboard timing values.
const MIN_INTERVAL_SECS: u64 = 1;

/// Keys accepted by [`ClientConfig::get`] and [`ClientConfig::set`].
pub const KEYS: &[&str] = &[
    "server.url",
    "server.api_key",
    "server.api_key_file",
    "defaults.profile",
    "defaults.output",
    "defaults.interactive",
    "dashboard.status_interval_secs",
    "dashboard.reconnect_delay_secs",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerSection,
    pub defaults: DefaultsSection,
    pub dashboard: DashboardSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Server origin, e.g. `http://scanner.local:8080`.
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// File holding the API key; read only when `api_key` is empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key_file: String,
    /// Key read from `api_key_file`, never persisted.
    #[serde(skip)]
    pub file_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSection {
    pub profile: String,
    pub output: String,
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSection {
    pub status_interval_secs: u64,
    pub reconnect_delay_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".into(),
            api_key: String::new(),
            api_key_file: String::new(),
            file_api_key: None,
        }
    }
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            profile: "standard".into(),
            output: "paperless".into(),
            interactive: false,
        }
    }
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            status_interval_secs: 10,
            reconnect_delay_secs: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No user configuration directory available")]
    NoConfigDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: &'static str,
    },
}

impl ClientConfig {
    /// `<config_dir>/scanflow/client.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the configuration at `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str::<Self>(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        config.load_api_key_file();
        Ok(config)
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        std::fs::write(path, data).map_err(write_err)
    }

    /// Apply `SCANFLOW_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.is_empty()) {
            self.server.url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.server.api_key = key;
        }
    }

    /// Apply `--server` / `--api-key` flags.
    pub fn apply_overrides(&mut self, server: Option<String>, api_key: Option<String>) {
        if let Some(url) = server {
            self.server.url = url;
        }
        if let Some(key) = api_key {
            self.server.api_key = key;
        }
    }

    /// Effective API key: the inline key, else the one read from file.
    pub fn api_key(&self) -> Option<String> {
        if !self.server.api_key.is_empty() {
            return Some(self.server.api_key.clone());
        }
        self.server.file_api_key.clone()
    }

    /// Status poll period, never below one second.
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard.status_interval_secs.max(MIN_INTERVAL_SECS))
    }

    /// Push channel retry delay, never below one second.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.dashboard.reconnect_delay_secs.max(MIN_INTERVAL_SECS))
    }

    /// Read a value by dotted key.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        let value = match key {
            "server.url" => self.server.url.clone(),
            "server.api_key" => self.server.api_key.clone(),
            "server.api_key_file" => self.server.api_key_file.clone(),
            "defaults.profile" => self.defaults.profile.clone(),
            "defaults.output" => self.defaults.output.clone(),
            "defaults.interactive" => self.defaults.interactive.to_string(),
            "dashboard.status_interval_secs" => self.dashboard.status_interval_secs.to_string(),
            "dashboard.reconnect_delay_secs" => self.dashboard.reconnect_delay_secs.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Update a value by dotted key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "server.url" => self.server.url = value.to_string(),
            "server.api_key" => self.server.api_key = value.to_string(),
            "server.api_key_file" => self.server.api_key_file = value.to_string(),
            "defaults.profile" => self.defaults.profile = value.to_string(),
            "defaults.output" => self.defaults.output = value.to_string(),
            "defaults.interactive" => {
                self.defaults.interactive = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "expected true or false",
                })?
            }
            "dashboard.status_interval_secs" => {
                self.dashboard.status_interval_secs = parse_secs(key, value)?
            }
            "dashboard.reconnect_delay_secs" => {
                self.dashboard.reconnect_delay_secs = parse_secs(key, value)?
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    fn load_api_key_file(&mut self) {
        if !self.server.api_key.is_empty() || self.server.api_key_file.is_empty() {
            return;
        }
        let path = expand_path(&self.server.api_key_file);
        match std::fs::read_to_string(&path) {
            Ok(key) => {
                let key = key.trim();
                if !key.is_empty() {
                    self.server.file_api_key = Some(key.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read API key file");
            }
        }
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a positive number of seconds",
        }),
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}
