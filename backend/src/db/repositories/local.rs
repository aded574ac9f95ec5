//! In-memory city repository.

use std::collections::BTreeMap;

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;

use crate::db::repository::{closest, CityRecord, CityRepository, RepositoryResult};
use crate::db::seed::default_cities;

/// City list held in a map keyed by lower-cased name.
///
/// Nothing is persisted; every instance starts from its seed.
#[derive(Default)]
pub struct LocalRepository {
    cities: RwLock<BTreeMap<String, CityRecord>>,
}

impl LocalRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository holding the built-in city list.
    pub fn with_defaults() -> Self {
        let repo = Self::new();
        {
            let mut cities = repo.cities.write();
            for record in default_cities() {
                cities.insert(record.city.to_lowercase(), record);
            }
            debug!("Seeded local repository with {} cities", cities.len());
        }
        repo
    }

    pub fn len(&self) -> usize {
        self.cities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.read().is_empty()
    }
}

#[async_trait]
impl CityRepository for LocalRepository {
    async fn find_city(&self, name: &str) -> RepositoryResult<Option<CityRecord>> {
        Ok(self.cities.read().get(&name.to_lowercase()).cloned())
    }

    async fn list_cities(&self) -> RepositoryResult<Vec<String>> {
        // BTreeMap keys are already ordered.
        Ok(self.cities.read().values().map(|r| r.city.clone()).collect())
    }

    async fn nearest_city(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> RepositoryResult<Option<CityRecord>> {
        let cities = self.cities.read();
        Ok(closest(cities.values(), latitude, longitude, max_distance_km))
    }

    async fn insert_city(&self, record: CityRecord) -> RepositoryResult<()> {
        record
            .validate()
            .map_err(|e| e.with_operation("insert_city"))?;
        self.cities
            .write()
            .insert(record.city.to_lowercase(), record);
        Ok(())
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
