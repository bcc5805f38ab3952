//! Client configuration
//!
//! # Load Order
//!
//! 1. Default values
//! 2. Config file (`~/.dkn/config.toml`)
//! 3. Environment variables (`DKN_API_URL`, `DKN_SESSION_DIR`, `DKN_TIMEOUT_SECS`)
//!
//! Command-line flags are applied by the binary on top of the loaded value
//! through the `with_*` methods.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default API origin
pub const DEFAULT_API_URL: &str = "https://dkn.hostbala.com";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Directory under the home directory holding config and session
pub const CONFIG_DIR: &str = ".dkn";

/// Config file name
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the API origin
pub const ENV_API_URL: &str = "DKN_API_URL";

/// Environment variable overriding the session directory
pub const ENV_SESSION_DIR: &str = "DKN_SESSION_DIR";

/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_SECS: &str = "DKN_TIMEOUT_SECS";

/// Default configuration directory (`~/.dkn`)
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Default config file path (`~/.dkn/config.toml`)
#[must_use]
pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE)
}

/// Resolved client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API origin, e.g. `https://dkn.hostbala.com` or `https://host/api`
    pub api_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Session directory, `~/.dkn` when unset
    pub session_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_dir: None,
        }
    }
}

impl ClientConfig {
    /// With API origin
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// With request timeout
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// With session directory
    #[must_use]
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Session directory, falling back to `~/.dkn`
    #[must_use]
    pub fn session_dir(&self) -> PathBuf {
        self.session_dir
            .as_deref()
            .map_or_else(default_config_dir, expand_tilde)
    }

    /// Origin with any trailing `/` removed
    #[must_use]
    pub fn api_origin(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Check that the origin is an http(s) URL
    ///
    /// # Errors
    /// - `ConfigError::InvalidOrigin` otherwise
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = self.api_origin();
        if origin.starts_with("http://") || origin.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidOrigin(self.api_url.clone()))
        }
    }
}

/// Layered configuration loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    skip_file: bool,
    skip_env: bool,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create loader with default sources
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the config file from a custom path
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Read environment overrides from a fixed map instead of the process
    #[must_use]
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Skip the config file
    #[must_use]
    pub fn skip_config_file(mut self) -> Self {
        self.skip_file = true;
        self
    }

    /// Skip environment overrides
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load and merge configuration from all sources.
    ///
    /// A missing config file is not an error.
    ///
    /// # Errors
    /// - `ConfigError` if the file exists but cannot be read or parsed, or an
    ///   environment variable holds an unusable value
    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::default();

        if !self.skip_file {
            let path = self
                .config_path
                .clone()
                .unwrap_or_else(default_config_path);
            if let Some(from_file) = load_file(&path)? {
                debug!(path = %path.display(), "loaded config file");
                config = from_file;
            }
        }

        if !self.skip_env {
            self.apply_env_vars(&mut config)?;
        }

        Ok(config)
    }

    fn var(&self, name: &str) -> Option<String> {
        let value = match &self.env {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.filter(|v| !v.is_empty())
    }

    fn apply_env_vars(&self, config: &mut ClientConfig) -> Result<(), ConfigError> {
        if let Some(url) = self.var(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(dir) = self.var(ENV_SESSION_DIR) {
            config.session_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = self.var(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(ENV_TIMEOUT_SECS, "expected seconds"))?;
        }
        Ok(())
    }
}

fn load_file(path: &Path) -> Result<Option<ClientConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|p| p.strip_prefix("~/")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
