//! Apparent position of the Sun (low-accuracy solar theory, about 0.01°).

use crate::coords::{ecliptic_to_equatorial, mean_obliquity};
use crate::time::{centuries, degnorm, ut_to_tt};
use crate::types::{EclipticPosition, EquatorialPosition};

/// Astronomical unit in km.
pub const AU_KM: f64 = 149_597_870.7;

/// Apparent geocentric ecliptic position for a TT Julian day.
pub fn sun_position_tt(jd_tt: f64) -> EclipticPosition {
    let t = centuries(jd_tt);

    let l0 = 280.46646 + 36_000.76983 * t + 0.0003032 * t * t;
    let m = 357.52911 + 35_999.05029 * t - 0.0001537 * t * t;
    let e = 0.016708634 - 0.000042037 * t - 0.0000001267 * t * t;
    let m_rad = m.to_radians();

    let c = (1.914602 - 0.004817 * t - 0.000014 * t * t) * m_rad.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m_rad).sin()
        + 0.000289 * (3.0 * m_rad).sin();

    let true_longitude = l0 + c;
    let anomaly = (m + c).to_radians();
    let r = 1.000001018 * (1.0 - e * e) / (1.0 + e * anomaly.cos());

    let omega = (125.04 - 1934.136 * t).to_radians();
    let apparent = true_longitude - 0.00569 - 0.00478 * omega.sin();

    EclipticPosition {
        longitude: degnorm(apparent),
        latitude: 0.0,
        distance_km: r * AU_KM,
    }
}

/// Apparent geocentric ecliptic position for a UT Julian day.
pub fn sun_position(jd_ut: f64) -> EclipticPosition {
    sun_position_tt(ut_to_tt(jd_ut))
}

/// Apparent geocentric right ascension and declination for a UT Julian day.
pub fn sun_equatorial(jd_ut: f64) -> EquatorialPosition {
    let jd_tt = ut_to_tt(jd_ut);
    let t = centuries(jd_tt);
    let omega = (125.04 - 1934.136 * t).to_radians();
    let eps = mean_obliquity(t) + 0.00256 * omega.cos();
    ecliptic_to_equatorial(&sun_position_tt(jd_tt), eps)
}

/// Semidiameter in degrees for a distance in km.
pub fn semidiameter(distance_km: f64) -> f64 {
    959.63 / (distance_km / AU_KM) / 3600.0
}

/// Equatorial horizontal parallax in degrees for a distance in km.
pub fn parallax(distance_km: f64) -> f64 {
    8.794 / (distance_km / AU_KM) / 3600.0
}
