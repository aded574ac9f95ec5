//! Shared type definitions: bodies, event selectors, observer position and
//! eclipse results.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use qtty::{Degrees, Meter, Quantity};
use serde::{Deserialize, Serialize};

use crate::error::{EphemError, Result};

/// Bodies supported by the ephemeris.
///
/// The discriminants follow the usual ephemeris numbering (Sun = 0, Moon = 1).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    Sun = 0,
    Moon = 1,
}

impl Body {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Body::Sun),
            1 => Some(Body::Moon),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which horizon or meridian event to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiseSetEvent {
    Rise,
    Set,
    /// Upper meridian transit
    Transit,
}

/// Observer position on the Earth.
///
/// Longitude is positive east of Greenwich.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub longitude: Degrees,
    pub latitude: Degrees,
    pub elevation: Quantity<Meter>,
}

impl GeoPosition {
    pub fn new(longitude_deg: f64, latitude_deg: f64, elevation_m: f64) -> Self {
        Self {
            longitude: Degrees::new(longitude_deg),
            latitude: Degrees::new(latitude_deg),
            elevation: Quantity::<Meter>::new(elevation_m),
        }
    }

    /// Reject coordinates no ephemeris routine can work with.
    pub fn validate(&self) -> Result<()> {
        let lon = self.longitude.value();
        let lat = self.latitude.value();
        let elev = self.elevation.value();

        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(EphemError::InvalidLocation(format!(
                "longitude {} outside [-180, 180]",
                lon
            )));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(EphemError::InvalidLocation(format!(
                "latitude {} outside [-90, 90]",
                lat
            )));
        }
        if !elev.is_finite() {
            return Err(EphemError::InvalidLocation(format!(
                "elevation {} is not finite",
                elev
            )));
        }
        Ok(())
    }
}

/// Atmospheric conditions used for refraction at the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    pub pressure_mbar: f64,
    pub temperature_c: f64,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            pressure_mbar: 1015.0,
            temperature_c: 15.0,
        }
    }
}

/// Calendar used when converting to and from Julian days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalendarKind {
    #[default]
    Gregorian,
    Julian,
}

/// Broken-down UTC date and time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtcComponents {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

/// Geocentric ecliptic position of date, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipticPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub distance_km: f64,
}

/// Equatorial position of date, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialPosition {
    pub right_ascension: f64,
    pub declination: f64,
    pub distance_km: f64,
}

/// Bit set describing an eclipse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EclipseFlags(u32);

impl EclipseFlags {
    pub const NONE: Self = Self(0);
    pub const TOTAL: Self = Self(1 << 2);
    pub const ANNULAR: Self = Self(1 << 3);
    pub const PARTIAL: Self = Self(1 << 4);
    pub const ANNULAR_TOTAL: Self = Self(1 << 5);
    pub const PENUMBRAL: Self = Self(1 << 6);
    pub const VISIBLE: Self = Self(1 << 7);
    pub const MAX_VISIBLE: Self = Self(1 << 8);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for EclipseFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EclipseFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Eclipse classification derived from [`EclipseFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EclipseKind {
    Total,
    Partial,
    Penumbral,
    Annular,
    AnnularTotal,
}

impl EclipseKind {
    /// First matching kind, checked in the order total, partial, penumbral,
    /// annular, annular-total.
    pub fn from_flags(flags: EclipseFlags) -> Option<Self> {
        if flags.contains(EclipseFlags::TOTAL) {
            Some(EclipseKind::Total)
        } else if flags.contains(EclipseFlags::PARTIAL) {
            Some(EclipseKind::Partial)
        } else if flags.contains(EclipseFlags::PENUMBRAL) {
            Some(EclipseKind::Penumbral)
        } else if flags.contains(EclipseFlags::ANNULAR) {
            Some(EclipseKind::Annular)
        } else if flags.contains(EclipseFlags::ANNULAR_TOTAL) {
            Some(EclipseKind::AnnularTotal)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EclipseKind::Total => "Total",
            EclipseKind::Partial => "Partial",
            EclipseKind::Penumbral => "Penumbral",
            EclipseKind::Annular => "Annular",
            EclipseKind::AnnularTotal => "Total Annular",
        }
    }
}

impl fmt::Display for EclipseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local circumstances of a lunar eclipse. All times are Julian days (UT).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LunarEclipse {
    pub flags: EclipseFlags,
    pub maximum: f64,
    pub penumbral_begin: f64,
    pub penumbral_end: f64,
    pub partial_begin: Option<f64>,
    pub partial_end: Option<f64>,
    pub total_begin: Option<f64>,
    pub total_end: Option<f64>,
    /// Moonrise inside the eclipse window, if any
    pub moonrise: Option<f64>,
    /// Moonset inside the eclipse window, if any
    pub moonset: Option<f64>,
}

impl LunarEclipse {
    pub fn kind(&self) -> Option<EclipseKind> {
        EclipseKind::from_flags(self.flags)
    }

    pub fn end(&self) -> f64 {
        self.penumbral_end
    }
}

/// Local circumstances of a solar eclipse. All times are Julian days (UT).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarEclipse {
    pub flags: EclipseFlags,
    pub maximum: f64,
    pub first_contact: f64,
    pub second_contact: Option<f64>,
    pub third_contact: Option<f64>,
    pub fourth_contact: f64,
    /// Sunrise inside the eclipse window, if any
    pub sunrise: Option<f64>,
    /// Sunset inside the eclipse window, if any
    pub sunset: Option<f64>,
    /// Fraction of the solar diameter covered at maximum
    pub magnitude: f64,
}

impl SolarEclipse {
    pub fn kind(&self) -> Option<EclipseKind> {
        EclipseKind::from_flags(self.flags)
    }

    pub fn end(&self) -> f64 {
        self.fourth_contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_ids_round_trip() {
        assert_eq!(Body::Sun.id(), 0);
        assert_eq!(Body::Moon.id(), 1);
        assert_eq!(Body::from_id(1), Some(Body::Moon));
        assert_eq!(Body::from_id(7), None);
    }

    #[test]
    fn test_eclipse_kind_priority() {
        let flags = EclipseFlags::TOTAL | EclipseFlags::PARTIAL | EclipseFlags::VISIBLE;
        assert_eq!(EclipseKind::from_flags(flags), Some(EclipseKind::Total));

        let flags = EclipseFlags::ANNULAR | EclipseFlags::VISIBLE;
        assert_eq!(EclipseKind::from_flags(flags), Some(EclipseKind::Annular));

        assert_eq!(
            EclipseKind::from_flags(EclipseFlags::ANNULAR_TOTAL),
            Some(EclipseKind::AnnularTotal)
        );
        assert_eq!(EclipseKind::from_flags(EclipseFlags::VISIBLE), None);
    }

    #[test]
    fn test_eclipse_kind_strings() {
        assert_eq!(EclipseKind::Total.to_string(), "Total");
        assert_eq!(EclipseKind::Penumbral.to_string(), "Penumbral");
        assert_eq!(EclipseKind::AnnularTotal.to_string(), "Total Annular");
    }

    #[test]
    fn test_flags_contains_ignores_empty() {
        assert!(!EclipseFlags::VISIBLE.contains(EclipseFlags::NONE));
        let mut flags = EclipseFlags::NONE;
        flags.insert(EclipseFlags::PARTIAL);
        flags |= EclipseFlags::MAX_VISIBLE;
        assert!(flags.contains(EclipseFlags::PARTIAL));
        assert!(flags.contains(EclipseFlags::MAX_VISIBLE));
        assert!(!flags.contains(EclipseFlags::TOTAL));
    }

    #[test]
    fn test_geo_position_validation() {
        assert!(GeoPosition::new(-119.44, 49.88, 350.0).validate().is_ok());
        assert!(GeoPosition::new(181.0, 0.0, 0.0).validate().is_err());
        assert!(GeoPosition::new(0.0, -90.5, 0.0).validate().is_err());
        assert!(GeoPosition::new(0.0, 0.0, f64::NAN).validate().is_err());
    }
}
