//! City database.
//!
//! Cities with their coordinates and IANA time zones are stored behind the
//! [`CityRepository`] trait so that storage backends can be swapped.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  services::location (LocationTimeZoneManager)           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  CityRepository trait (repository/mod.rs)               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴───────────────┐
//!     │                               │
//! ┌───▼──────────────┐   ┌────────────▼─────┐
//! │ SqliteRepository │   │ LocalRepository  │
//! │  (rusqlite)      │   │  (in-memory)     │
//! └──────────────────┘   └──────────────────┘
//! ```
//!
//! Use [`RepositoryFactory`] or [`RepositoryBuilder`] to obtain an
//! `Arc<dyn CityRepository>`.

#[cfg(not(any(feature = "sqlite-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod seed;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::{RepositoryConfig, RepositorySettings, SqliteSettings};
pub use repositories::LocalRepository;
#[cfg(feature = "sqlite-repo")]
pub use repositories::SqliteRepository;
pub use repository::{
    CityRecord, CityRepository, ErrorContext, RepositoryError, RepositoryResult,
};
pub use seed::default_cities;
