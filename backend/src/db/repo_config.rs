//! Repository section of the configuration file.
//!
//! The repository only reads `[repository]` and `[sqlite]` from
//! `astrocal.toml`; other sections are ignored here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::factory::RepositoryType;
use super::repository::RepositoryError;

/// `[repository]` and `[sqlite]` read from `astrocal.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub sqlite: SqliteSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

/// SQLite database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteSettings {
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
    /// Fill an empty city table with the built-in list.
    #[serde(default = "default_seed")]
    pub seed_defaults: bool,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
            seed_defaults: default_seed(),
        }
    }
}

fn default_repo_type() -> String {
    "sqlite".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("astrocal.db")
}

fn default_seed() -> bool {
    true
}

impl RepositoryConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::config(format!("Failed to parse config file: {}", e))
        })
    }

    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_config() {
        let toml = r#"
[repository]
type = "local"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.repository.repo_type, "local");
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
        assert_eq!(config.sqlite, SqliteSettings::default());
    }

    #[test]
    fn test_parse_sqlite_config() {
        let toml = r#"
[repository]
type = "sqlite"

[sqlite]
path = "/var/lib/astrocal/cities.db"
seed_defaults = false

[gps]
timeout_secs = 10
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Sqlite);
        assert_eq!(config.sqlite.path, PathBuf::from("/var/lib/astrocal/cities.db"));
        assert!(!config.sqlite.seed_defaults);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: RepositoryConfig = toml::from_str("").unwrap();
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Sqlite);
        assert!(config.sqlite.seed_defaults);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("astrocal.toml");
        std::fs::write(&path, "[repository\ntype = ").unwrap();

        let err = RepositoryConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, RepositoryError::Config { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
