//! Coordinate transformations: obliquity and nutation, sidereal time,
//! ecliptic/equatorial/horizontal frames and the topocentric correction.

use serde::{Deserialize, Serialize};

use crate::time::{degnorm, julian_centuries_tt, J2000};
use crate::types::{Atmosphere, EclipticPosition, EquatorialPosition, GeoPosition};

/// Equatorial radius of the Earth in km.
pub const EARTH_RADIUS_KM: f64 = 6378.14;
/// Polar to equatorial axis ratio (b/a) of the reference ellipsoid.
const EARTH_AXIS_RATIO: f64 = 0.99664719;

/// Nutation in longitude and obliquity, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nutation {
    pub longitude: f64,
    pub obliquity: f64,
}

/// Altitude and azimuth in degrees. Azimuth is measured from north through east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Horizontal {
    pub azimuth: f64,
    pub altitude: f64,
}

/// Mean obliquity of the ecliptic in degrees for `t` Julian centuries (TT).
pub fn mean_obliquity(t: f64) -> f64 {
    let seconds = 21.448 - 46.8150 * t - 0.00059 * t * t + 0.001813 * t * t * t;
    23.0 + 26.0 / 60.0 + seconds / 3600.0
}

/// Low-precision nutation (about 0.5″ in longitude, 0.1″ in obliquity).
pub fn nutation(t: f64) -> Nutation {
    let omega = (125.04452 - 1934.136261 * t + 0.0020708 * t * t + t * t * t / 450_000.0)
        .to_radians();
    let l_sun = (280.4665 + 36_000.7698 * t).to_radians();
    let l_moon = (218.3165 + 481_267.8813 * t).to_radians();

    let dpsi = -17.20 * omega.sin() - 1.32 * (2.0 * l_sun).sin() - 0.23 * (2.0 * l_moon).sin()
        + 0.21 * (2.0 * omega).sin();
    let deps = 9.20 * omega.cos() + 0.57 * (2.0 * l_sun).cos() + 0.10 * (2.0 * l_moon).cos()
        - 0.09 * (2.0 * omega).cos();

    Nutation {
        longitude: dpsi / 3600.0,
        obliquity: deps / 3600.0,
    }
}

/// True obliquity of the ecliptic in degrees for `t` Julian centuries (TT).
pub fn true_obliquity(t: f64) -> f64 {
    mean_obliquity(t) + nutation(t).obliquity
}

/// Greenwich mean sidereal time in degrees.
pub fn mean_sidereal_time(jd_ut: f64) -> f64 {
    let t = (jd_ut - J2000) / 36_525.0;
    degnorm(
        280.46061837 + 360.98564736629 * (jd_ut - J2000) + 0.000387933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Greenwich apparent sidereal time in degrees.
pub fn apparent_sidereal_time(jd_ut: f64) -> f64 {
    let t = julian_centuries_tt(jd_ut);
    let nut = nutation(t);
    let eps = mean_obliquity(t) + nut.obliquity;
    degnorm(mean_sidereal_time(jd_ut) + nut.longitude * eps.to_radians().cos())
}

/// Ecliptic of date to equatorial of date, for obliquity `eps` in degrees.
pub fn ecliptic_to_equatorial(ecl: &EclipticPosition, eps: f64) -> EquatorialPosition {
    let (lam, bet, eps) = (
        ecl.longitude.to_radians(),
        ecl.latitude.to_radians(),
        eps.to_radians(),
    );

    let ra = (lam.sin() * eps.cos() - bet.tan() * eps.sin()).atan2(lam.cos());
    let dec = (bet.sin() * eps.cos() + bet.cos() * eps.sin() * lam.sin()).asin();

    EquatorialPosition {
        right_ascension: degnorm(ra.to_degrees()),
        declination: dec.to_degrees(),
        distance_km: ecl.distance_km,
    }
}

/// Geocentric rectangular coordinates of the observer in km, equatorial
/// frame of date.
fn observer_vector(jd_ut: f64, geo: &GeoPosition) -> [f64; 3] {
    let phi = geo.latitude.value().to_radians();
    let height = geo.elevation.value() / 1000.0 / EARTH_RADIUS_KM;

    let u = (EARTH_AXIS_RATIO * phi.tan()).atan();
    let rho_sin = EARTH_AXIS_RATIO * u.sin() + height * phi.sin();
    let rho_cos = u.cos() + height * phi.cos();

    let theta = (apparent_sidereal_time(jd_ut) + geo.longitude.value()).to_radians();
    [
        EARTH_RADIUS_KM * rho_cos * theta.cos(),
        EARTH_RADIUS_KM * rho_cos * theta.sin(),
        EARTH_RADIUS_KM * rho_sin,
    ]
}

/// Shift a geocentric position to the observer's location.
pub fn topocentric(eq: &EquatorialPosition, jd_ut: f64, geo: &GeoPosition) -> EquatorialPosition {
    let (ra, dec) = (eq.right_ascension.to_radians(), eq.declination.to_radians());
    let d = eq.distance_km;
    let obs = observer_vector(jd_ut, geo);

    let x = d * dec.cos() * ra.cos() - obs[0];
    let y = d * dec.cos() * ra.sin() - obs[1];
    let z = d * dec.sin() - obs[2];
    let rho = x.hypot(y);

    EquatorialPosition {
        right_ascension: degnorm(y.atan2(x).to_degrees()),
        declination: z.atan2(rho).to_degrees(),
        distance_km: rho.hypot(z),
    }
}

/// Local hour angle in degrees, normalised to `[-180, 180)`.
pub fn hour_angle(eq: &EquatorialPosition, jd_ut: f64, geo: &GeoPosition) -> f64 {
    crate::time::difdeg2n(
        apparent_sidereal_time(jd_ut) + geo.longitude.value(),
        eq.right_ascension,
    )
}

/// Altitude and azimuth of an equatorial position.
pub fn horizontal(eq: &EquatorialPosition, jd_ut: f64, geo: &GeoPosition) -> Horizontal {
    let h = hour_angle(eq, jd_ut, geo).to_radians();
    let dec = eq.declination.to_radians();
    let phi = geo.latitude.value().to_radians();

    let alt = (phi.sin() * dec.sin() + phi.cos() * dec.cos() * h.cos()).asin();
    let az = (-dec.cos() * h.sin()).atan2(dec.sin() * phi.cos() - dec.cos() * phi.sin() * h.cos());

    Horizontal {
        azimuth: degnorm(az.to_degrees()),
        altitude: alt.to_degrees(),
    }
}

/// Refraction in degrees for a body on the apparent horizon.
pub fn horizon_refraction(atm: &Atmosphere) -> f64 {
    // Bennett's formula at h = 0 gives 34.5′ for 1010 mbar and 10 °C.
    34.5 / 60.0 * (atm.pressure_mbar / 1010.0) * (283.0 / (273.0 + atm.temperature_c))
}

/// Angular separation in degrees between two equatorial positions.
pub fn angular_separation(a: &EquatorialPosition, b: &EquatorialPosition) -> f64 {
    let (d1, d2) = (a.declination.to_radians(), b.declination.to_radians());
    let dra = (b.right_ascension - a.right_ascension).to_radians();

    let x = d1.cos() * d2.sin() - d1.sin() * d2.cos() * dra.cos();
    let y = d2.cos() * dra.sin();
    let z = d1.sin() * d2.sin() + d1.cos() * d2.cos() * dra.cos();

    x.hypot(y).atan2(z).to_degrees()
}

/// Equatorial horizontal parallax in degrees for a distance in km.
pub fn horizontal_parallax(distance_km: f64) -> f64 {
    (EARTH_RADIUS_KM / distance_km).asin().to_degrees()
}
