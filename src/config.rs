use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "USAGE_REPORT_CONFIG";
pub const BASE_URL_ENV: &str = "USAGE_REPORT_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root URL of the reporting services
    pub base_url: String,
    /// Account-list service, relative to `base_url`
    pub accounts_path: String,
    /// Zone-list service, relative to `base_url`
    pub zones_path: String,
    /// Endpoint-catalog service, relative to `base_url`
    pub endpoints_path: String,
    /// Query-execution service, relative to `base_url`
    pub query_path: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8787"),
            accounts_path: String::from("accounts"),
            zones_path: String::from("zones"),
            endpoints_path: String::from("endpoints"),
            query_path: String::from("query"),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(".config")
    });
    base.join("usage-report").join("config.toml")
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(stripped) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(raw)
}

pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    if let Some(path) = config_path {
        return path.to_path_buf();
    }
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return expand_home(&env_path);
    }
    default_config_path()
}

/// Load configuration from a TOML file. If the file doesn't exist, default
/// values are returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Apply `--base-url`, falling back to `USAGE_REPORT_BASE_URL`.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.or_else(|| std::env::var(BASE_URL_ENV).ok()) {
            self.base_url = url;
        }
        self
    }
}
