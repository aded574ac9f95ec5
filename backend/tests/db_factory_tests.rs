//! Tests for db::factory - repository creation and configuration.

mod support;

use std::fs;
use std::str::FromStr;

use astrocal::db::{
    CityRecord, RepositoryBuilder, RepositoryConfig, RepositoryFactory, RepositoryType,
    SqliteSettings,
};

#[test]
fn test_repository_type_from_str() {
    assert_eq!(RepositoryType::from_str("SQLite").unwrap(), RepositoryType::Sqlite);
    assert_eq!(RepositoryType::from_str("sqlite3").unwrap(), RepositoryType::Sqlite);
    assert_eq!(RepositoryType::from_str("LOCAL").unwrap(), RepositoryType::Local);

    let err = RepositoryType::from_str("postgres").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", None), ("SQLITE_PATH", None)], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });
}

#[test]
fn test_repository_type_from_env_with_sqlite_path() {
    support::with_scoped_env(
        &[("REPOSITORY_TYPE", None), ("SQLITE_PATH", Some("/tmp/cities.db"))],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Sqlite);
        },
    );
}

#[test]
fn test_repository_type_from_env_explicit() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("SQLITE_PATH", Some("/tmp/cities.db")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[tokio::test]
async fn test_create_local() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
    assert!(repo.find_city("Kelowna").await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_sqlite_seeds_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.db");
    let settings = SqliteSettings {
        path: path.clone(),
        seed_defaults: true,
    };

    let repo = RepositoryFactory::create(RepositoryType::Sqlite, Some(&settings))
        .await
        .unwrap();
    let names = repo.list_cities().await.unwrap();
    assert!(names.contains(&"london".to_string()));
    repo.insert_city(CityRecord::new("lisbon", -9.1393, 38.7223, 2.0, "Europe/Lisbon"))
        .await
        .unwrap();
    drop(repo);

    let reopened = RepositoryBuilder::new()
        .repository_type(RepositoryType::Sqlite)
        .sqlite_path(&path)
        .seed_defaults(false)
        .build()
        .await
        .unwrap();
    let lisbon = reopened.find_city("LISBON").await.unwrap().unwrap();
    assert_eq!(lisbon.timezone, "Europe/Lisbon");
    assert_eq!(reopened.list_cities().await.unwrap().len(), names.len() + 1);
}

#[tokio::test]
async fn test_unseeded_sqlite_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let repo = RepositoryBuilder::new()
        .repository_type(RepositoryType::Sqlite)
        .sqlite_path(dir.path().join("empty.db"))
        .seed_defaults(false)
        .build()
        .await
        .unwrap();
    assert!(repo.list_cities().await.unwrap().is_empty());
    assert!(repo.nearest_city(51.5, 0.0, 50.0).await.unwrap().is_none());
}

#[tokio::test]
async fn test_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("astrocal.toml");
    let db_path = dir.path().join("from-config.db");
    fs::write(
        &config_path,
        format!(
            "[repository]\ntype = \"sqlite\"\n\n[sqlite]\npath = {:?}\n",
            db_path.display().to_string()
        ),
    )
    .unwrap();

    let config = RepositoryConfig::from_file(&config_path).unwrap();
    assert_eq!(config.repository_type().unwrap(), RepositoryType::Sqlite);
    assert!(config.sqlite.seed_defaults);

    let repo = RepositoryFactory::from_config_file(&config_path).await.unwrap();
    assert!(repo.find_city("tokyo").await.unwrap().is_some());
    assert!(db_path.exists());
}

#[tokio::test]
async fn test_invalid_config_type() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("astrocal.toml");
    fs::write(&config_path, "[repository]\ntype = \"postgres\"\n").unwrap();

    let err = RepositoryFactory::from_config_file(&config_path)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("Invalid repository type"));
}
