//! # Application Configuration
//!
//! Settings the admin shell needs before it can open the database.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SERMAC_*`)
//! 2. Config file (`sermac.toml`, explicit path or platform config dir)
//! 3. Defaults (this file)
//!
//! Validated once after loading; read-only afterwards.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sermac_core::{DEFAULT_DIAS_VENCIMIENTO, DEFAULT_STOCK_MINIMO};
use sermac_db::DbConfig;
use tracing_subscriber::EnvFilter;

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "sermac.toml";

/// Database next to the executable, as the desktop install expects.
pub const DEFAULT_CONNECTION_STRING: &str = "Data Source=AdminSERMAC.db;Version=3;";

pub const DEFAULT_LOG_FILTER: &str = "info,sermac=debug,sqlx=warn";

pub const ENV_CONNECTION_STRING: &str = "SERMAC_CONNECTION_STRING";
pub const ENV_STOCK_MINIMO: &str = "SERMAC_STOCK_MINIMO";
pub const ENV_DIAS_VENCIMIENTO: &str = "SERMAC_DIAS_VENCIMIENTO";
pub const ENV_LOG: &str = "SERMAC_LOG";

/// Application configuration.
///
/// Missing keys in the TOML file keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// ADO-style or `sqlite://` connection string
    pub connection_string: String,

    /// Products under this many units count as low stock
    pub stock_minimo: i64,

    /// Lots expiring within this many days are reported
    pub dias_vencimiento: i64,

    /// tracing `EnvFilter` directive, used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            connection_string: DEFAULT_CONNECTION_STRING.to_string(),
            stock_minimo: DEFAULT_STOCK_MINIMO,
            dias_vencimiento: DEFAULT_DIAS_VENCIMIENTO,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the config file, then `SERMAC_*` variables.
    ///
    /// With `path` set the file must exist. Without it, `sermac.toml` in
    /// the platform config directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| env::var(key).ok())
    }

    /// [`AppConfig::load`] with a custom environment lookup.
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. Not validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_CONNECTION_STRING) {
            self.connection_string = value;
        }
        if let Some(value) = lookup(ENV_STOCK_MINIMO) {
            self.stock_minimo = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_STOCK_MINIMO.to_string()))?;
        }
        if let Some(value) = lookup(ENV_DIAS_VENCIMIENTO) {
            self.dias_vencimiento = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_DIAS_VENCIMIENTO.to_string()))?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            self.log_filter = value;
        }
        Ok(())
    }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_string.trim().is_empty() {
            return Err(ConfigError::MissingRequired("connection_string".to_string()));
        }
        DbConfig::from_connection_string(&self.connection_string)
            .map_err(|_| ConfigError::InvalidValue("connection_string".to_string()))?;

        if self.stock_minimo < 0 {
            return Err(ConfigError::InvalidValue("stock_minimo".to_string()));
        }
        if self.dias_vencimiento < 0 {
            return Err(ConfigError::InvalidValue("dias_vencimiento".to_string()));
        }
        EnvFilter::try_new(&self.log_filter)
            .map_err(|_| ConfigError::InvalidValue("log_filter".to_string()))?;
        Ok(())
    }
}

/// `sermac.toml` in the platform config directory.
///
/// - **Linux**: `~/.config/sermac-admin/sermac.toml`
/// - **macOS**: `~/Library/Application Support/cl.sermac.sermac-admin/sermac.toml`
/// - **Windows**: `%APPDATA%\sermac\sermac-admin\config\sermac.toml`
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("cl", "sermac", "sermac-admin")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
