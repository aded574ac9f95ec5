//! Application configuration.
//!
//! Settings come from `astrocal.toml` (see [`find_config_file`]) with
//! environment variables taking precedence. Every key has a default, so
//! running without a file is fine.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono_tz::Tz;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{RepositoryConfig, RepositorySettings, RepositoryType, SqliteSettings};
use crate::services::settings::AuthorizationStatus;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "ASTROCAL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Location of the user preference file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSettings {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSettings {
    /// Zone used before the user's settings have been read.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsSettings {
    /// Seconds to wait for a usable fix before falling back to the city.
    #[serde(default = "default_gps_timeout")]
    pub timeout_secs: u64,
    /// Fixes with a worse horizontal accuracy are ignored.
    #[serde(default = "default_max_accuracy")]
    pub max_accuracy_m: f64,
    /// Authorization reported by the server's location provider.
    #[serde(default = "default_authorization")]
    pub authorization: AuthorizationStatus,
}

impl Default for GpsSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_gps_timeout(),
            max_accuracy_m: default_max_accuracy(),
            authorization: default_authorization(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub sqlite: SqliteSettings,
    #[serde(default)]
    pub settings: PreferenceSettings,
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub gps: GpsSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("astrocal-settings.toml")
}

fn default_timezone() -> String {
    "America/Vancouver".to_string()
}

fn default_gps_timeout() -> u64 {
    30
}

fn default_max_accuracy() -> f64 {
    100.0
}

fn default_authorization() -> AuthorizationStatus {
    AuthorizationStatus::AuthorizedWhenInUse
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// First configuration file found.
///
/// `ASTROCAL_CONFIG` wins when set, whether or not the file exists, so a
/// typo surfaces as a read error. Otherwise looks in:
/// 1. `astrocal.toml`
/// 2. `backend/astrocal.toml`
/// 3. `../astrocal.toml`
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    [
        "astrocal.toml",
        "backend/astrocal.toml",
        "../astrocal.toml",
    ]
    .into_iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read the configuration file (if any), apply environment overrides
    /// and validate the result.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match find_config_file() {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override file values with `REPOSITORY_TYPE`, `SQLITE_PATH`,
    /// `SETTINGS_PATH`, `HOST` and `PORT` when they are set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(repo_type) = env::var("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        if let Ok(path) = env::var("SQLITE_PATH") {
            self.sqlite.path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("SETTINGS_PATH") {
            self.settings.path = PathBuf::from(path);
        }
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT '{}' is not a valid port", port)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.repository_type()?;
        self.default_timezone()?;
        if !self.gps.max_accuracy_m.is_finite() || self.gps.max_accuracy_m <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "gps.max_accuracy_m must be positive, got {}",
                self.gps.max_accuracy_m
            )));
        }
        Ok(())
    }

    pub fn repository_type(&self) -> Result<RepositoryType, ConfigError> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(ConfigError::Invalid)
    }

    pub fn default_timezone(&self) -> Result<Tz, ConfigError> {
        self.calendar.default_timezone.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "unknown time zone '{}'",
                self.calendar.default_timezone
            ))
        })
    }

    /// The `[repository]` and `[sqlite]` sections on their own.
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            repository: self.repository.clone(),
            sqlite: self.sqlite.clone(),
        }
    }
}
