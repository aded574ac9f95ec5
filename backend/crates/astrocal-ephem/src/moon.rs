//! Geocentric position of the Moon.
//!
//! Truncated ELP-2000/82 series (the 60 largest terms in longitude and
//! distance and 60 in latitude) with the Venus, Jupiter and flattening
//! corrections. Accuracy is about 10″ in longitude and 4″ in latitude.

use crate::coords::{ecliptic_to_equatorial, mean_obliquity, nutation, EARTH_RADIUS_KM};
use crate::time::{centuries, degnorm, ut_to_tt};
use crate::types::{EclipticPosition, EquatorialPosition};

/// Multiples of D, M, M', F and the coefficients of sin (1e-6 deg) and
/// cos (1e-3 km).
type LrTerm = (i8, i8, i8, i8, f64, f64);
/// Multiples of D, M, M', F and the coefficient of sin (1e-6 deg).
type BTerm = (i8, i8, i8, i8, f64);

#[rustfmt::skip]
const LR_TERMS: [LrTerm; 60] = [
    (0, 0, 1, 0, 6288774.0, -20905355.0),
    (2, 0, -1, 0, 1274027.0, -3699111.0),
    (2, 0, 0, 0, 658314.0, -2955968.0),
    (0, 0, 2, 0, 213618.0, -569925.0),
    (0, 1, 0, 0, -185116.0, 48888.0),
    (0, 0, 0, 2, -114332.0, -3149.0),
    (2, 0, -2, 0, 58793.0, 246158.0),
    (2, -1, -1, 0, 57066.0, -152138.0),
    (2, 0, 1, 0, 53322.0, -170733.0),
    (2, -1, 0, 0, 45758.0, -204586.0),
    (0, 1, -1, 0, -40923.0, -129620.0),
    (1, 0, 0, 0, -34720.0, 108743.0),
    (0, 1, 1, 0, -30383.0, 104755.0),
    (2, 0, 0, -2, 15327.0, 10321.0),
    (0, 0, 1, 2, -12528.0, 0.0),
    (0, 0, 1, -2, 10980.0, 79661.0),
    (4, 0, -1, 0, 10675.0, -34782.0),
    (0, 0, 3, 0, 10034.0, -23210.0),
    (4, 0, -2, 0, 8548.0, -21636.0),
    (2, 1, -1, 0, -7888.0, 24208.0),
    (2, 1, 0, 0, -6766.0, 30824.0),
    (1, 0, -1, 0, -5163.0, -8379.0),
    (1, 1, 0, 0, 4987.0, -16675.0),
    (2, -1, 1, 0, 4036.0, -12831.0),
    (2, 0, 2, 0, 3994.0, -10445.0),
    (4, 0, 0, 0, 3861.0, -11650.0),
    (2, 0, -3, 0, 3665.0, 14403.0),
    (0, 1, -2, 0, -2689.0, -7003.0),
    (2, 0, -1, 2, -2602.0, 0.0),
    (2, -1, -2, 0, 2390.0, 10056.0),
    (1, 0, 1, 0, -2348.0, 6322.0),
    (2, -2, 0, 0, 2236.0, -9884.0),
    (0, 1, 2, 0, -2120.0, 5751.0),
    (0, 2, 0, 0, -2069.0, 0.0),
    (2, -2, -1, 0, 2048.0, -4950.0),
    (2, 0, 1, -2, -1773.0, 4130.0),
    (2, 0, 0, 2, -1595.0, 0.0),
    (4, -1, -1, 0, 1215.0, -3958.0),
    (0, 0, 2, 2, -1110.0, 0.0),
    (3, 0, -1, 0, -892.0, 3258.0),
    (2, 1, 1, 0, -810.0, 2616.0),
    (4, -1, -2, 0, 759.0, -1897.0),
    (0, 2, -1, 0, -713.0, -2117.0),
    (2, 2, -1, 0, -700.0, 2354.0),
    (2, 1, -2, 0, 691.0, 0.0),
    (2, -1, 0, -2, 596.0, 0.0),
    (4, 0, 1, 0, 549.0, -1423.0),
    (0, 0, 4, 0, 537.0, -1117.0),
    (4, -1, 0, 0, 520.0, -1571.0),
    (1, 0, -2, 0, -487.0, -1739.0),
    (2, 1, 0, -2, -399.0, 0.0),
    (0, 0, 2, -2, -381.0, -4421.0),
    (1, 1, 1, 0, 351.0, 0.0),
    (3, 0, -2, 0, -340.0, 0.0),
    (4, 0, -3, 0, 330.0, 0.0),
    (2, -1, 2, 0, 327.0, 0.0),
    (0, 2, 1, 0, -323.0, 1165.0),
    (1, 1, -1, 0, 299.0, 0.0),
    (2, 0, 3, 0, 294.0, 0.0),
    (2, 0, -1, -2, 0.0, 8752.0),
];

#[rustfmt::skip]
const B_TERMS: [BTerm; 60] = [
    (0, 0, 0, 1, 5128122.0),
    (0, 0, 1, 1, 280602.0),
    (0, 0, 1, -1, 277693.0),
    (2, 0, 0, -1, 173237.0),
    (2, 0, -1, 1, 55413.0),
    (2, 0, -1, -1, 46271.0),
    (2, 0, 0, 1, 32573.0),
    (0, 0, 2, 1, 17198.0),
    (2, 0, 1, -1, 9266.0),
    (0, 0, 2, -1, 8822.0),
    (2, -1, 0, -1, 8216.0),
    (2, 0, -2, -1, 4324.0),
    (2, 0, 1, 1, 4200.0),
    (2, 1, 0, -1, -3359.0),
    (2, -1, -1, 1, 2463.0),
    (2, -1, 0, 1, 2211.0),
    (2, -1, -1, -1, 2065.0),
    (0, 1, -1, -1, -1870.0),
    (4, 0, -1, -1, 1828.0),
    (0, 1, 0, 1, -1794.0),
    (0, 0, 0, 3, -1749.0),
    (0, 1, -1, 1, -1565.0),
    (1, 0, 0, 1, -1491.0),
    (0, 1, 1, 1, -1475.0),
    (0, 1, 1, -1, -1410.0),
    (0, 1, 0, -1, -1344.0),
    (1, 0, 0, -1, -1335.0),
    (0, 0, 3, 1, 1107.0),
    (4, 0, 0, -1, 1021.0),
    (4, 0, -1, 1, 833.0),
    (0, 0, 1, -3, 777.0),
    (4, 0, -2, 1, 671.0),
    (2, 0, 0, -3, 607.0),
    (2, 0, 2, -1, 596.0),
    (2, -1, 1, -1, 491.0),
    (2, 0, -2, 1, -451.0),
    (0, 0, 3, -1, 439.0),
    (2, 0, 2, 1, 422.0),
    (2, 0, -3, -1, 421.0),
    (2, 1, -1, 1, -366.0),
    (2, 1, 0, 1, -351.0),
    (4, 0, 0, 1, 331.0),
    (2, -1, 1, 1, 315.0),
    (2, -2, 0, -1, 302.0),
    (0, 0, 1, 3, -283.0),
    (2, 1, 1, -1, -229.0),
    (1, 1, 0, -1, 223.0),
    (1, 1, 0, 1, 223.0),
    (0, 1, -2, -1, -220.0),
    (2, 1, -1, -1, -220.0),
    (1, 0, 1, 1, -185.0),
    (2, -1, -2, -1, 181.0),
    (0, 1, 2, 1, -177.0),
    (4, 0, -2, -1, 176.0),
    (4, -1, -1, -1, 166.0),
    (1, 0, 1, -1, -164.0),
    (4, 0, 1, -1, 132.0),
    (1, 0, -1, -1, -119.0),
    (4, -1, 0, -1, 115.0),
    (2, -2, 0, 1, 107.0),
];

/// Fundamental arguments in degrees for `t` Julian centuries (TT).
struct Arguments {
    l_prime: f64,
    d: f64,
    m: f64,
    m_prime: f64,
    f: f64,
    e: f64,
}

impl Arguments {
    fn new(t: f64) -> Self {
        let t2 = t * t;
        let t3 = t2 * t;
        let t4 = t3 * t;
        Self {
            l_prime: degnorm(
                218.3164477 + 481_267.88123421 * t - 0.0015786 * t2 + t3 / 538_841.0
                    - t4 / 65_194_000.0,
            ),
            d: degnorm(
                297.8501921 + 445_267.1114034 * t - 0.0018819 * t2 + t3 / 545_868.0
                    - t4 / 113_065_000.0,
            ),
            m: degnorm(357.5291092 + 35_999.0502909 * t - 0.0001536 * t2 + t3 / 24_490_000.0),
            m_prime: degnorm(
                134.9633964 + 477_198.8675055 * t + 0.0087414 * t2 + t3 / 69_699.0
                    - t4 / 14_712_000.0,
            ),
            f: degnorm(
                93.2720950 + 483_202.0175233 * t - 0.0036539 * t2 - t3 / 3_526_000.0
                    + t4 / 863_310_000.0,
            ),
            e: 1.0 - 0.002516 * t - 0.0000074 * t2,
        }
    }

    /// Argument of a periodic term in radians and its eccentricity factor.
    fn term(&self, d: i8, m: i8, mp: i8, f: i8) -> (f64, f64) {
        let arg = f64::from(d) * self.d
            + f64::from(m) * self.m
            + f64::from(mp) * self.m_prime
            + f64::from(f) * self.f;
        let factor = match m.abs() {
            1 => self.e,
            2 => self.e * self.e,
            _ => 1.0,
        };
        (arg.to_radians(), factor)
    }
}

/// Geometric geocentric ecliptic position (mean equinox of date) for a TT
/// Julian day.
pub fn moon_position_tt(jd_tt: f64) -> EclipticPosition {
    let t = centuries(jd_tt);
    let args = Arguments::new(t);

    let a1 = (119.75 + 131.849 * t).to_radians();
    let a2 = (53.09 + 479_264.290 * t).to_radians();
    let a3 = (313.45 + 481_266.484 * t).to_radians();
    let l_prime = args.l_prime.to_radians();
    let f = args.f.to_radians();
    let m_prime = args.m_prime.to_radians();

    let (mut sum_l, mut sum_r) = (0.0, 0.0);
    for &(d, m, mp, ff, l_coef, r_coef) in LR_TERMS.iter() {
        let (arg, factor) = args.term(d, m, mp, ff);
        sum_l += l_coef * factor * arg.sin();
        sum_r += r_coef * factor * arg.cos();
    }

    let mut sum_b = 0.0;
    for &(d, m, mp, ff, b_coef) in B_TERMS.iter() {
        let (arg, factor) = args.term(d, m, mp, ff);
        sum_b += b_coef * factor * arg.sin();
    }

    sum_l += 3958.0 * a1.sin() + 1962.0 * (l_prime - f).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * l_prime.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - f).sin()
        + 175.0 * (a1 + f).sin()
        + 127.0 * (l_prime - m_prime).sin()
        - 115.0 * (l_prime + m_prime).sin();

    EclipticPosition {
        longitude: degnorm(args.l_prime + sum_l / 1_000_000.0),
        latitude: sum_b / 1_000_000.0,
        distance_km: 385_000.56 + sum_r / 1000.0,
    }
}

/// Apparent geocentric ecliptic position for a UT Julian day (nutation in
/// longitude applied).
pub fn moon_position(jd_ut: f64) -> EclipticPosition {
    let jd_tt = ut_to_tt(jd_ut);
    let mut pos = moon_position_tt(jd_tt);
    pos.longitude = degnorm(pos.longitude + nutation(centuries(jd_tt)).longitude);
    pos
}

/// Apparent geocentric right ascension and declination for a UT Julian day.
pub fn moon_equatorial(jd_ut: f64) -> EquatorialPosition {
    let t = centuries(ut_to_tt(jd_ut));
    let eps = mean_obliquity(t) + nutation(t).obliquity;
    ecliptic_to_equatorial(&moon_position(jd_ut), eps)
}

/// Semidiameter in degrees for a distance in km.
pub fn semidiameter(distance_km: f64) -> f64 {
    358_473_400.0 / distance_km / 3600.0
}

/// Equatorial horizontal parallax in degrees for a distance in km.
pub fn parallax(distance_km: f64) -> f64 {
    (EARTH_RADIUS_KM / distance_km).asin().to_degrees()
}
