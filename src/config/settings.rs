//! User settings and preferences
//!
//! Manages application settings stored in ~/.pgcell/config.toml

use crate::config::connections::{ConnectionParameters, DEFAULT_PORT, SslMode};
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub connection: ConnectionDefaults,

    #[serde(default)]
    pub ui: UiSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Values used to prefill the connection form. Passwords are never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub ssl_mode: SslMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// Maximum gap between two clicks on the same cell to count as a double-click
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `tracing` filter directive, overridden by RUST_LOG
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_double_click_ms() -> u64 {
    400
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: String::new(),
            user: String::new(),
            ssl_mode: SslMode::default(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            double_click_ms: default_double_click_ms(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_level(),
        }
    }
}

impl ConnectionDefaults {
    /// Form prefill; the password comes from elsewhere (PGPASSWORD or typing)
    pub fn to_parameters(&self, password: String) -> ConnectionParameters {
        ConnectionParameters {
            database: self.database.clone(),
            user: self.user.clone(),
            password,
            host: self.host.clone(),
            port: self.port,
            ssl_mode: self.ssl_mode,
        }
    }
}

/// Get the config directory path (~/.pgcell/)
pub fn config_dir() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".pgcell"))
}

/// Load settings from the default location, falling back to defaults
pub fn load_settings() -> ConfigResult<Settings> {
    load_settings_from(&config_dir()?.join("config.toml"))
}

/// Load settings from an explicit path; a missing file yields defaults
pub fn load_settings_from(path: &Path) -> ConfigResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse settings from TOML text
pub fn parse_settings(content: &str) -> ConfigResult<Settings> {
    let settings: Settings = toml::from_str(content)?;
    if settings.ui.double_click_ms == 0 {
        return Err(ConfigError::Invalid(
            "ui.double_click_ms must be greater than zero".to_string(),
        ));
    }
    Ok(settings)
}
