//! SQLite city repository.
//!
//! The city list lives in a single `CityList` table. rusqlite is
//! synchronous, so every call locks the shared connection on a blocking
//! worker thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::repository::{
    closest, CityRecord, CityRepository, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::db::seed::default_cities;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS CityList (
    City TEXT PRIMARY KEY COLLATE NOCASE,
    Lon REAL NOT NULL,
    Lat REAL NOT NULL,
    Elev REAL NOT NULL DEFAULT 0,
    TimeZone TEXT NOT NULL
);
"#;

const SELECT_CITY: &str =
    "SELECT City, Lon, Lat, Elev, TimeZone FROM CityList WHERE City = ?1 COLLATE NOCASE";
const SELECT_ALL: &str = "SELECT City, Lon, Lat, Elev, TimeZone FROM CityList ORDER BY City";
const UPSERT_CITY: &str = r#"
INSERT INTO CityList (City, Lon, Lat, Elev, TimeZone) VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(City) DO UPDATE SET
    Lon = excluded.Lon,
    Lat = excluded.Lat,
    Elev = excluded.Elev,
    TimeZone = excluded.TimeZone
"#;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteLocation {
    File(PathBuf),
    Memory,
}

/// City repository backed by an embedded SQLite database.
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
    location: SqliteLocation,
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CityRecord> {
    Ok(CityRecord {
        city: row.get(0)?,
        longitude: row.get(1)?,
        latitude: row.get(2)?,
        elevation: row.get(3)?,
        timezone: row.get(4)?,
    })
}

fn upsert(conn: &Connection, record: &CityRecord) -> rusqlite::Result<usize> {
    conn.execute(
        UPSERT_CITY,
        params![
            record.city,
            record.longitude,
            record.latitude,
            record.elevation,
            record.timezone
        ],
    )
}

impl SqliteRepository {
    /// Open (creating if needed) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, seed_defaults: bool) -> RepositoryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| {
            RepositoryError::connection(e.to_string())
                .with_context(ErrorContext::new("open").with_details(path.display().to_string()))
        })?;
        Self::from_connection(conn, SqliteLocation::File(path), seed_defaults)
    }

    /// Private in-memory database, gone when the repository is dropped.
    pub fn open_in_memory(seed_defaults: bool) -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, SqliteLocation::Memory, seed_defaults)
    }

    fn from_connection(
        conn: Connection,
        location: SqliteLocation,
        seed_defaults: bool,
    ) -> RepositoryResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| RepositoryError::from(e).with_operation("create_schema"))?;

        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        };
        if seed_defaults {
            repo.seed_if_empty()?;
        }
        Ok(repo)
    }

    pub fn location(&self) -> &SqliteLocation {
        &self.location
    }

    /// Fill the table with the built-in cities when it has no rows.
    /// Returns the number of rows written.
    pub fn seed_if_empty(&self) -> RepositoryResult<usize> {
        let mut conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM CityList", [], |row| row.get(0))?;
        if count > 0 {
            debug!("CityList already holds {} rows, not seeding", count);
            return Ok(0);
        }

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::from(e).with_operation("seed_begin"))?;
        let cities = default_cities();
        for record in &cities {
            upsert(&tx, record).map_err(|e| RepositoryError::from(e).with_operation("seed"))?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::from(e).with_operation("seed_commit"))?;

        info!("Seeded CityList with {} default cities", cities.len());
        Ok(cities.len())
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn with_connection<F, T>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&Connection) -> RepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await?
    }
}

#[async_trait]
impl CityRepository for SqliteRepository {
    async fn find_city(&self, name: &str) -> RepositoryResult<Option<CityRecord>> {
        let name = name.to_string();
        self.with_connection(move |conn| {
            conn.query_row(SELECT_CITY, params![name], record_from_row)
                .optional()
                .map_err(|e| RepositoryError::from(e).with_operation("find_city"))
        })
        .await
    }

    async fn list_cities(&self) -> RepositoryResult<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT City FROM CityList ORDER BY City")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        })
        .await
    }

    async fn nearest_city(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> RepositoryResult<Option<CityRecord>> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(SELECT_ALL)?;
            let records = stmt
                .query_map([], record_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(closest(&records, latitude, longitude, max_distance_km))
        })
        .await
    }

    async fn insert_city(&self, record: CityRecord) -> RepositoryResult<()> {
        record
            .validate()
            .map_err(|e| e.with_operation("insert_city"))?;
        self.with_connection(move |conn| {
            upsert(conn, &record)
                .map_err(|e| RepositoryError::from(e).with_operation("insert_city"))?;
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_connection(|conn| {
            let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            Ok(one == 1)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_seeded() {
        let repo = SqliteRepository::open_in_memory(true).unwrap();
        assert!(repo.health_check().await.unwrap());

        let names = repo.list_cities().await.unwrap();
        assert_eq!(names.len(), default_cities().len());
        assert!(names.windows(2).all(|w| w[0].to_lowercase() <= w[1].to_lowercase()));

        let london = repo.find_city("LONDON").await.unwrap().unwrap();
        assert_eq!(london.city, "london");
        assert_eq!(london.timezone, "Europe/London");
    }

    #[tokio::test]
    async fn test_unseeded_is_empty() {
        let repo = SqliteRepository::open_in_memory(false).unwrap();
        assert!(repo.list_cities().await.unwrap().is_empty());
        assert!(repo.find_city("london").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let repo = SqliteRepository::open_in_memory(true).unwrap();
        assert_eq!(repo.seed_if_empty().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_is_case_insensitive() {
        let repo = SqliteRepository::open_in_memory(true).unwrap();
        let before = repo.list_cities().await.unwrap().len();

        repo.insert_city(CityRecord::new("KELOWNA", -119.4, 49.9, 344.0, "America/Vancouver"))
            .await
            .unwrap();

        assert_eq!(repo.list_cities().await.unwrap().len(), before);
        let kelowna = repo.find_city("kelowna").await.unwrap().unwrap();
        assert_eq!(kelowna.elevation, 344.0);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.db");

        {
            let repo = SqliteRepository::open(&path, false).unwrap();
            repo.insert_city(CityRecord::new("windhoek", 17.08, -22.56, 1655.0, "Africa/Windhoek"))
                .await
                .unwrap();
        }

        let reopened = SqliteRepository::open(&path, true).unwrap();
        assert_eq!(reopened.location(), &SqliteLocation::File(path.clone()));
        // Table was not empty, so no defaults were added.
        assert_eq!(reopened.list_cities().await.unwrap(), vec!["windhoek"]);
    }

    #[tokio::test]
    async fn test_nearest_city() {
        let repo = SqliteRepository::open_in_memory(true).unwrap();
        let hit = repo.nearest_city(51.45, 0.0, 50.0).await.unwrap().unwrap();
        assert_eq!(hit.city, "london");
        assert!(repo.nearest_city(-60.0, 0.0, 50.0).await.unwrap().is_none());
    }
}
