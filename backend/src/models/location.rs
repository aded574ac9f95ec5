use astrocal_ephem::GeoPosition;
use qtty::{Degrees, Meter, Quantity};
use serde::{Deserialize, Serialize};

/// Name given to a location while the GPS has not produced a usable fix.
pub const FETCHING_LOCATION: &str = "Fetching Location";

/// An observing site: optional display name plus geodetic coordinates.
///
/// Longitude is positive east of Greenwich, elevation is above sea level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub longitude: Degrees,
    pub latitude: Degrees,
    pub elevation: Quantity<Meter>,
}

impl Location {
    pub fn new(city: Option<String>, longitude_deg: f64, latitude_deg: f64, elevation_m: f64) -> Self {
        Self {
            city,
            longitude: Degrees::new(longitude_deg),
            latitude: Degrees::new(latitude_deg),
            elevation: Quantity::<Meter>::new(elevation_m),
        }
    }

    /// Location used when nothing else is configured.
    pub fn kelowna() -> Self {
        Self::new(Some("kelowna".to_string()), -119.443606, 49.880134, 350.0)
    }

    /// Placeholder returned while waiting for a GPS fix.
    pub fn fetching() -> Self {
        Self::new(Some(FETCHING_LOCATION.to_string()), 0.0, 0.0, 0.0)
    }

    pub fn to_geo(&self) -> GeoPosition {
        GeoPosition::new(
            self.longitude.value(),
            self.latitude.value(),
            self.elevation.value(),
        )
    }

    /// City name with each word capitalised, or "" when unnamed.
    pub fn display_name(&self) -> String {
        let Some(city) = self.city.as_deref() else {
            return String::new();
        };
        let mut out = String::with_capacity(city.len());
        let mut word_start = true;
        for c in city.chars() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = c.is_whitespace();
        }
        out
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::kelowna()
    }
}
