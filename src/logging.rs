//! Logging setup
//!
//! The terminal belongs to the UI, so log output goes to a file:
//! `~/.pgcell/logs/pgcell.log`. `RUST_LOG` takes precedence over the level in
//! the settings file. Passwords never appear in log fields.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::settings::{LoggingSettings, config_dir};

pub const LOG_FILE_NAME: &str = "pgcell.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where the log file is written
    pub log_dir: PathBuf,

    /// Filter used when RUST_LOG is not set
    pub default_filter: String,

    /// Whether to log at all
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: log_directory(),
            default_filter: "info".to_string(),
            enabled: true,
        }
    }
}

impl LoggingConfig {
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            default_filter: settings.level.clone(),
            enabled: settings.enabled,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}

/// Install the global subscriber.
///
/// Returns the appender guard; keep it alive until exit so buffered lines are
/// flushed. Returns `None` when logging is disabled.
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    if !config.enabled {
        return Ok(None);
    }

    std::fs::create_dir_all(&config.log_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(&config.log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        log_file = %config.log_file().display(),
        version = env!("CARGO_PKG_VERSION"),
        "logging initialized"
    );

    Ok(Some(guard))
}

/// `~/.pgcell/logs`, or `./logs` without a home directory
pub fn log_directory() -> PathBuf {
    config_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = LoggingSettings {
            enabled: false,
            level: "debug,pgcell=trace".to_string(),
        };
        let config = LoggingConfig::from_settings(&settings);
        assert!(!config.enabled);
        assert_eq!(config.default_filter, "debug,pgcell=trace");
    }

    #[test]
    fn test_log_file_name() {
        let config = LoggingConfig {
            log_dir: PathBuf::from("/tmp/pgcell-logs"),
            ..LoggingConfig::default()
        };
        assert_eq!(config.log_file(), PathBuf::from("/tmp/pgcell-logs/pgcell.log"));
    }

    #[test]
    fn test_disabled_init_installs_nothing() {
        let guard = init(&LoggingConfig::disabled()).unwrap();
        assert!(guard.is_none());
    }
}
