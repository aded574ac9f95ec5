//! Repository implementations module.
//!
//! - `sqlite`: embedded SQLite database through rusqlite
//! - `local`: in-memory implementation for unit testing and local development
pub mod local;
#[cfg(feature = "sqlite-repo")]
pub mod sqlite;

pub use local::LocalRepository;
#[cfg(feature = "sqlite-repo")]
pub use sqlite::SqliteRepository;
