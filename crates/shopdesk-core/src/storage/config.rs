//! Configuration management
//!
//! TOML configuration stored under the user's config directory.
//! API URL priority: CLI argument > SHOPDESK_API_URL environment variable > config.toml > default

use super::Result;
use crate::error::{ConfigError, StorageError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_URL_ENV: &str = "SHOPDESK_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application configuration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Backend API base URL
    pub api_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Rows per page for list commands
    pub page_size: u32,
    /// Quiet interval for the interactive search
    pub search_debounce_ms: u64,
    pub security: SecurityConfig,
}

/// Login lockout and session lifetime settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    pub max_login_attempts: u32,
    pub lockout_minutes: u32,
    pub session_timeout_hours: u32,
}

/// Accepted ranges for the security settings.
const MAX_LOCKOUT_MINUTES: u32 = 7 * 24 * 60;
const MAX_SESSION_TIMEOUT_HOURS: u32 = 365 * 24;

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_secs: 30,
            page_size: 10,
            search_debounce_ms: 500,
            security: SecurityConfig::default(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_minutes: 15,
            session_timeout_hours: 24,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            log::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
                message: format!("Failed to parse config file: {}", e),
            })?;
        config.security.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }

        let toml_content =
            toml::to_string_pretty(self).map_err(|e| StorageError::ConfigParseError {
                message: format!("Failed to serialize config: {}", e),
            })?;

        fs::write(&config_path, toml_content).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        Ok(())
    }

    /// `~/.config/shopdesk`
    pub fn default_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().ok_or(StorageError::ConfigDirNotFound)?;
        Ok(home_dir.join(".config").join("shopdesk"))
    }

    /// Config file inside `dir`, or inside the default directory.
    pub fn file_in(dir: Option<&Path>) -> Result<PathBuf> {
        match dir {
            Some(d) => Ok(d.join(CONFIG_FILE_NAME)),
            None => Self::config_file_path(),
        }
    }

    fn config_file_path() -> Result<PathBuf> {
        Ok(Self::default_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Resolve the API base URL: explicit override, then environment, then file, then default.
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| std::env::var(API_URL_ENV).ok().filter(|s| !s.is_empty()))
            .or_else(|| self.api_url.clone().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Set a single key by its dotted name, as used by `config set`.
    pub fn set_value(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        fn parse<T: std::str::FromStr>(
            key: &str,
            value: &str,
        ) -> std::result::Result<T, ConfigError> {
            value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
                field: key.to_string(),
                value: value.to_string(),
                reason: "expected a non-negative integer".to_string(),
            })
        }

        match key {
            "api_url" => {
                crate::utils::validation::validate_url(value).map_err(|e| {
                    ConfigError::InvalidValue {
                        field: key.to_string(),
                        value: value.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                self.api_url = Some(value.trim_end_matches('/').to_string());
            }
            "timeout_secs" => self.timeout_secs = parse(key, value)?,
            "page_size" => self.page_size = parse(key, value)?,
            "search_debounce_ms" => self.search_debounce_ms = parse(key, value)?,
            "security.max_login_attempts"
            | "security.lockout_minutes"
            | "security.session_timeout_hours" => {
                let mut security = self.security.clone();
                let parsed = parse(key, value)?;
                match key {
                    "security.max_login_attempts" => security.max_login_attempts = parsed,
                    "security.lockout_minutes" => security.lockout_minutes = parsed,
                    _ => security.session_timeout_hours = parsed,
                }
                security.validate()?;
                self.security = security;
            }
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: key.to_string(),
                    value: value.to_string(),
                    reason: "unknown configuration key".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl SecurityConfig {
    /// Reject values that would disable the lockout or overflow expiry arithmetic.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        fn check(field: &str, value: u32, max: u32) -> std::result::Result<(), ConfigError> {
            if (1..=max).contains(&value) {
                return Ok(());
            }
            Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
                reason: format!("expected a value between 1 and {}", max),
            })
        }

        check("security.max_login_attempts", self.max_login_attempts, u32::MAX)?;
        check("security.lockout_minutes", self.lockout_minutes, MAX_LOCKOUT_MINUTES)?;
        check(
            "security.session_timeout_hours",
            self.session_timeout_hours,
            MAX_SESSION_TIMEOUT_HOURS,
        )
    }
}
