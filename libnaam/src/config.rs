//! Configuration management for the NAAM client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub version: String,
    /// Static cookie sent with every request (tunnel deployments need it)
    #[serde(default)]
    pub cookie: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Where the session keys live
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub storage: SessionBackend,
    #[serde(default = "default_session_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Amounts above this settle over RTGS, the rest over NEFT
    #[serde(default = "default_rtgs_threshold")]
    pub rtgs_threshold: f64,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_session_path() -> String {
    "~/.local/share/naam/session.json".to_string()
}

fn default_resend_cooldown() -> u64 {
    30
}

fn default_rtgs_threshold() -> f64 {
    200_000.0
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: SessionBackend::default(),
            path: default_session_path(),
        }
    }
}

impl SessionConfig {
    /// Session file path with `~` expanded
    pub fn expand_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_secs: default_resend_cooldown(),
        }
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            rtgs_threshold: default_rtgs_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing config file is not an error: the defaults are used. The
    /// `NAAM_API_BASE_URL` environment variable overrides the base URL.
    pub fn load() -> Result<Self> {
        Self::load_at(None)
    }

    /// Like `load`, but an explicit `path` must exist
    pub fn load_at(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let mut config = Self::load_from_path(path)?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!("No config at {:?}, using defaults", config_path);
            Self::default_config()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://api.naam.coop".to_string(),
                version: default_api_version(),
                cookie: None,
                timeout_secs: default_timeout_secs(),
            },
            session: SessionConfig::default(),
            otp: OtpConfig::default(),
            payments: PaymentsConfig::default(),
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("api.base_url".to_string()).into());
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(format!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            ))
            .into());
        }
        if self.payments.rtgs_threshold <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "payments.rtgs_threshold must be positive".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Root of every endpoint path, e.g. `https://api.naam.coop/api/v1`
    pub fn api_root(&self) -> String {
        format!(
            "{}/api/{}",
            self.api.base_url.trim_end_matches('/'),
            self.api.version.trim_matches('/')
        )
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NAAM_API_BASE_URL") {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
    }
}

/// Resolve the configuration file path (`$NAAM_CONFIG`, then the XDG config dir)
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("NAAM_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("naam").join("config.toml"))
}
