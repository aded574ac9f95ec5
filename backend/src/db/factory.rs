//! Selection of the city repository backend.
//!
//! The backend comes from `[repository] type` in `astrocal.toml`, from
//! `REPOSITORY_TYPE`, or from code through [`RepositoryBuilder`].

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use log::info;

use super::repo_config::{RepositoryConfig, SqliteSettings};
use super::repositories::LocalRepository;
#[cfg(feature = "sqlite-repo")]
use super::repositories::SqliteRepository;
use super::repository::{CityRepository, RepositoryError, RepositoryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// City table in an SQLite file
    Sqlite,
    /// Built-in cities held in memory
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "local" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// `REPOSITORY_TYPE` if set (unparsable values mean local), otherwise
    /// SQLite when `SQLITE_PATH` is set and local when it is not.
    pub fn from_env() -> Self {
        match std::env::var("REPOSITORY_TYPE") {
            Ok(val) => val.parse().unwrap_or(Self::Local),
            Err(_) if std::env::var_os("SQLITE_PATH").is_some() => Self::Sqlite,
            Err(_) => Self::Local,
        }
    }
}

fn invalid_type(e: String) -> RepositoryError {
    RepositoryError::config(format!("Invalid repository type: {}", e))
}

/// Opens city repositories.
///
/// ```ignore
/// let repo = RepositoryFactory::create(RepositoryType::Local, None).await?;
/// let london = repo.find_city("london").await?;
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// `sqlite` falls back to [`SqliteSettings::default`] when absent.
    pub async fn create(
        repo_type: RepositoryType,
        sqlite: Option<&SqliteSettings>,
    ) -> RepositoryResult<Arc<dyn CityRepository>> {
        match repo_type {
            #[cfg(feature = "sqlite-repo")]
            RepositoryType::Sqlite => {
                let settings = sqlite.cloned().unwrap_or_default();
                let repo: Arc<dyn CityRepository> = Self::open_sqlite(&settings).await?;
                Ok(repo)
            }
            #[cfg(not(feature = "sqlite-repo"))]
            RepositoryType::Sqlite => {
                let _ = sqlite;
                Err(RepositoryError::config(
                    "built without the sqlite-repo feature",
                ))
            }
            RepositoryType::Local => Ok(Arc::new(LocalRepository::with_defaults())),
        }
    }

    /// Open the database file off the async runtime.
    #[cfg(feature = "sqlite-repo")]
    pub async fn open_sqlite(settings: &SqliteSettings) -> RepositoryResult<Arc<SqliteRepository>> {
        let path = settings.path.clone();
        let seed = settings.seed_defaults;
        info!("Opening city database {}", path.display());
        let repo = tokio::task::spawn_blocking(move || SqliteRepository::open(path, seed)).await??;
        Ok(Arc::new(repo))
    }

    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn CityRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config).await
    }

    pub async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn CityRepository>> {
        let repo_type = config.repository_type().map_err(invalid_type)?;
        Self::create(repo_type, Some(&config.sqlite)).await
    }
}

/// Repository options set in code, starting from the environment's choice.
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    sqlite: SqliteSettings,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::from_env(),
            sqlite: SqliteSettings::default(),
        }
    }

    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    pub fn sqlite_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sqlite.path = path.into();
        self
    }

    pub fn seed_defaults(mut self, seed: bool) -> Self {
        self.sqlite.seed_defaults = seed;
        self
    }

    pub async fn build(self) -> RepositoryResult<Arc<dyn CityRepository>> {
        RepositoryFactory::create(self.repo_type, Some(&self.sqlite)).await
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
