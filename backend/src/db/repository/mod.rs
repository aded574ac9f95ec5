//! Repository trait for the city list.
//!
//! The application never talks to a storage engine directly. It goes
//! through [`CityRepository`], which the SQLite and in-memory backends
//! implement.

pub mod error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Location;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// One row of the city list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub city: String,
    /// Degrees, positive east.
    pub longitude: f64,
    pub latitude: f64,
    /// Metres above sea level.
    pub elevation: f64,
    /// IANA zone name, e.g. "Europe/London".
    pub timezone: String,
}

impl CityRecord {
    pub fn new(
        city: impl Into<String>,
        longitude: f64,
        latitude: f64,
        elevation: f64,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            longitude,
            latitude,
            elevation,
            timezone: timezone.into(),
        }
    }

    pub fn to_location(&self) -> Location {
        Location::new(
            Some(self.city.clone()),
            self.longitude,
            self.latitude,
            self.elevation,
        )
    }

    /// Reject records that could never be used for an ephemeris computation.
    pub fn validate(&self) -> RepositoryResult<()> {
        let problem = if self.city.trim().is_empty() {
            Some("city name is empty".to_string())
        } else if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            Some(format!("longitude {} outside [-180, 180]", self.longitude))
        } else if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            Some(format!("latitude {} outside [-90, 90]", self.latitude))
        } else if !self.elevation.is_finite() {
            Some("elevation is not finite".to_string())
        } else {
            None
        };

        match problem {
            Some(message) => Err(RepositoryError::invalid(message).with_context(
                ErrorContext::new("validate_city")
                    .with_entity("city")
                    .with_entity_id(&self.city),
            )),
            None => Ok(()),
        }
    }

    /// Great-circle distance to a point, in kilometres (haversine).
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

/// Storage of known cities with their coordinates and time zones.
///
/// City names compare case-insensitively everywhere.
#[async_trait]
pub trait CityRepository: Send + Sync {
    /// Look up a city by name.
    async fn find_city(&self, name: &str) -> RepositoryResult<Option<CityRecord>>;

    /// All city names, ordered by name.
    async fn list_cities(&self) -> RepositoryResult<Vec<String>>;

    /// Closest city to a point, if one lies within `max_distance_km`.
    async fn nearest_city(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> RepositoryResult<Option<CityRecord>>;

    /// Insert or replace a city.
    async fn insert_city(&self, record: CityRecord) -> RepositoryResult<()>;

    async fn health_check(&self) -> RepositoryResult<bool>;
}

/// Pick the closest record within `max_distance_km`. Shared by the backends
/// that cannot push the distance computation into a query.
pub(crate) fn closest<'a, I>(
    records: I,
    latitude: f64,
    longitude: f64,
    max_distance_km: f64,
) -> Option<CityRecord>
where
    I: IntoIterator<Item = &'a CityRecord>,
{
    records
        .into_iter()
        .map(|r| (r.distance_km(latitude, longitude), r))
        .filter(|(d, _)| *d <= max_distance_km)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, r)| r.clone())
}
