//! City coordinates and time zones.

use std::env;
use std::sync::Arc;

use chrono_tz::Tz;
use log::warn;

use crate::db::{CityRecord, CityRepository, RepositoryResult};
use crate::models::Location;
use crate::time::parse_tz;

/// Resolves city names to coordinates and zones through the city repository.
#[derive(Clone)]
pub struct LocationTimeZoneManager {
    repo: Arc<dyn CityRepository>,
}

impl LocationTimeZoneManager {
    pub fn new(repo: Arc<dyn CityRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn CityRepository> {
        &self.repo
    }

    /// Zone named by `TZ`, or UTC when unset or not an IANA name.
    pub fn timezone_from_system() -> Tz {
        env::var("TZ")
            .ok()
            .and_then(|name| parse_tz(name.trim_start_matches(':')))
            .unwrap_or(Tz::UTC)
    }

    pub async fn city(&self, city: &str) -> RepositoryResult<Option<CityRecord>> {
        self.repo.find_city(city).await
    }

    pub async fn gps_from_city_name(&self, city: &str) -> RepositoryResult<Option<Location>> {
        Ok(self.repo.find_city(city).await?.map(|r| r.to_location()))
    }

    pub async fn timezone_from_city(&self, city: &str) -> RepositoryResult<Option<Tz>> {
        let Some(record) = self.repo.find_city(city).await? else {
            return Ok(None);
        };
        let tz = parse_tz(&record.timezone);
        if tz.is_none() {
            warn!(
                "City '{}' has unknown time zone '{}'",
                record.city, record.timezone
            );
        }
        Ok(tz)
    }

    pub async fn all_locations(&self) -> RepositoryResult<Vec<String>> {
        self.repo.list_cities().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;

    fn manager() -> LocationTimeZoneManager {
        LocationTimeZoneManager::new(Arc::new(LocalRepository::with_defaults()))
    }

    #[tokio::test]
    async fn test_city_lookup_is_case_insensitive() {
        let m = manager();
        let loc = m.gps_from_city_name("London").await.unwrap().unwrap();
        assert_eq!(loc.city.as_deref(), Some("london"));
        assert_eq!(
            m.timezone_from_city("LONDON").await.unwrap(),
            Some(chrono_tz::Europe::London)
        );
    }

    #[tokio::test]
    async fn test_unknown_city() {
        let m = manager();
        assert!(m.gps_from_city_name("atlantis").await.unwrap().is_none());
        assert!(m.timezone_from_city("atlantis").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bad_zone_yields_none() {
        let repo = Arc::new(LocalRepository::new());
        repo.insert_city(CityRecord::new("nowhere", 0.0, 0.0, 0.0, "Mars/Base"))
            .await
            .unwrap();
        let m = LocationTimeZoneManager::new(repo);
        assert!(m.gps_from_city_name("nowhere").await.unwrap().is_some());
        assert!(m.timezone_from_city("nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_locations_sorted() {
        let names = manager().all_locations().await.unwrap();
        assert!(names.contains(&"kelowna".to_string()));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }
}
