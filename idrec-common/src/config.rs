//! Configuration loading
//!
//! Bootstrap settings are resolved in priority order:
//! 1. Command-line arguments (clap also maps `IDREC_*` variables onto these)
//! 2. `PORT` environment variable (port only)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: the service logs a warning and
//! starts with defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Port used when nothing else is configured
pub const DEFAULT_PORT: u16 = 3000;

/// Bind host used when nothing else is configured
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Environment variable consulted for the listening port
pub const PORT_ENV: &str = "PORT";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// HTTP bind host
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve configuration from CLI overrides, environment, TOML file and
    /// compiled defaults
    ///
    /// `toml_path` of `None` means "use the platform default location, if
    /// any".
    pub fn resolve(toml_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match toml_path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => load_toml_config(&path)?.unwrap_or_default(),
            None => TomlConfig::default(),
        };

        let port = match overrides.port {
            Some(port) => port,
            None => match port_from_env()? {
                Some(port) => port,
                None => toml_config.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let host = overrides
            .host
            .or(toml_config.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let database_path = overrides
            .database_path
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        let log_level = overrides.log_level.unwrap_or(toml_config.logging.level);

        Ok(Self {
            host,
            port,
            database_path,
            log_level,
        })
    }

    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load a TOML configuration file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(None);
    }

    let toml_str = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config: TomlConfig = toml::from_str(&toml_str)
        .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(Some(config))
}

fn port_from_env() -> Result<Option<u16>> {
    match std::env::var(PORT_ENV) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", PORT_ENV, value, e))),
        _ => Ok(None),
    }
}

/// Platform config file location (`~/.config/idrec/idrec.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("idrec").join("idrec.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("idrec"))
        .unwrap_or_else(|| PathBuf::from("./idrec_data"))
        .join("contacts.db")
}
