//! Built-in city list used to populate an empty repository.

use super::repository::CityRecord;

#[rustfmt::skip]
const DEFAULT_CITIES: &[(&str, f64, f64, f64, &str)] = &[
    // city, lon, lat, elevation (m), zone
    ("auckland",     174.7633, -36.8485,  196.0, "Pacific/Auckland"),
    ("berlin",        13.4050,  52.5200,   34.0, "Europe/Berlin"),
    ("buenos aires", -58.3816, -34.6037,   25.0, "America/Argentina/Buenos_Aires"),
    ("cairo",         31.2357,  30.0444,   23.0, "Africa/Cairo"),
    ("calgary",     -114.0719,  51.0447, 1045.0, "America/Edmonton"),
    ("cape town",     18.4241, -33.9249,   25.0, "Africa/Johannesburg"),
    ("honolulu",    -157.8583,  21.3069,    6.0, "Pacific/Honolulu"),
    ("kelowna",     -119.443606, 49.880134, 350.0, "America/Vancouver"),
    ("london",        -0.1278,  51.5074,   11.0, "Europe/London"),
    ("los angeles", -118.2437,  34.0522,   71.0, "America/Los_Angeles"),
    ("mexico city",  -99.1332,  19.4326, 2240.0, "America/Mexico_City"),
    ("moscow",        37.6173,  55.7558,  156.0, "Europe/Moscow"),
    ("mumbai",        72.8777,  19.0760,   14.0, "Asia/Kolkata"),
    ("new york",     -74.0060,  40.7128,   10.0, "America/New_York"),
    ("paris",          2.3522,  48.8566,   35.0, "Europe/Paris"),
    ("reykjavik",    -21.8174,  64.1265,   15.0, "Atlantic/Reykjavik"),
    ("sydney",       151.2093, -33.8688,   58.0, "Australia/Sydney"),
    ("tokyo",        139.6917,  35.6895,   40.0, "Asia/Tokyo"),
    ("toronto",      -79.3832,  43.6532,   76.0, "America/Toronto"),
    ("vancouver",   -123.1207,  49.2827,   70.0, "America/Vancouver"),
    ("windhoek",      17.0832, -22.5609, 1655.0, "Africa/Windhoek"),
];

/// The cities a fresh installation knows about.
pub fn default_cities() -> Vec<CityRecord> {
    DEFAULT_CITIES
        .iter()
        .map(|&(city, lon, lat, elev, tz)| CityRecord::new(city, lon, lat, elev, tz))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid_and_sorted() {
        let cities = default_cities();
        assert!(cities.iter().all(|c| c.validate().is_ok()));
        assert!(cities.windows(2).all(|w| w[0].city < w[1].city));
        assert!(cities.iter().any(|c| c.city == "london"));
        assert!(cities.iter().any(|c| c.city == "kelowna"));
    }

    #[test]
    fn test_default_zones_parse() {
        for city in default_cities() {
            assert!(
                city.timezone.parse::<chrono_tz::Tz>().is_ok(),
                "{} has unknown zone {}",
                city.city,
                city.timezone
            );
        }
    }
}
