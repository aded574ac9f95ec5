//! Search for lunar and solar eclipses visible from a location.
//!
//! Both searches walk the relevant syzygies (full moons for lunar, new moons
//! for solar), discard those where the Moon is too far from the ecliptic and
//! then sample a window of ±6 h around the syzygy. Contacts are refined by
//! bisection and the maximum by golden-section search.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::coords::{angular_separation, horizontal_parallax, topocentric};
use crate::error::{EphemError, Result};
use crate::moon::{self, moon_equatorial, moon_position};
use crate::phenomena::{next_syzygy, Syzygy};
use crate::rise_set::{is_above_horizon, rise_trans};
use crate::sun::{self, sun_equatorial};
use crate::time::degnorm;
use crate::types::{
    Atmosphere, Body, EclipseFlags, EquatorialPosition, GeoPosition, LunarEclipse, RiseSetEvent,
    SolarEclipse,
};

const HALF_WINDOW_DAYS: f64 = 0.25;
const SAMPLE_STEP_DAYS: f64 = 2.0 / 1440.0;
const PRECISION_DAYS: f64 = 0.5 / 86_400.0;
/// Candidates need the Moon closer than this to the ecliptic (degrees).
const MAX_MOON_LATITUDE: f64 = 1.6;
/// Enlargement of the Earth's shadow by the atmosphere.
const SHADOW_ENLARGEMENT: f64 = 1.02;
/// Ratio between the Earth's radius at latitude 45° and its equatorial radius.
const EARTH_FLATTENING_FACTOR: f64 = 0.99834;

/// Options controlling an eclipse search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Give up once candidates are this many years after the start.
    pub max_years: f64,
    pub atmosphere: Atmosphere,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_years: 40.0,
            atmosphere: Atmosphere::default(),
        }
    }
}

fn golden_minimum<F: Fn(f64) -> f64>(f: F, mut a: f64, mut b: f64) -> f64 {
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    let mut c = b - ratio * (b - a);
    let mut d = a + ratio * (b - a);
    while b - a > PRECISION_DAYS {
        if f(c) < f(d) {
            b = d;
        } else {
            a = c;
        }
        c = b - ratio * (b - a);
        d = a + ratio * (b - a);
    }
    0.5 * (a + b)
}

/// Root of `f` in `[lo, hi]`, given that the endpoints differ in sign.
fn bisect_root<F: Fn(f64) -> f64>(f: F, mut lo: f64, mut hi: f64) -> f64 {
    let lo_negative = f(lo) < 0.0;
    while hi - lo > PRECISION_DAYS {
        let mid = 0.5 * (lo + hi);
        if (f(mid) < 0.0) == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Instant of the smallest value of `f` in the window around `center`.
fn window_minimum<F: Fn(f64) -> f64>(f: F, center: f64) -> f64 {
    let start = center - HALF_WINDOW_DAYS;
    let samples = (2.0 * HALF_WINDOW_DAYS / SAMPLE_STEP_DAYS).round() as usize;

    let mut best = (0usize, f64::INFINITY);
    for i in 0..=samples {
        let v = f(start + i as f64 * SAMPLE_STEP_DAYS);
        if v < best.1 {
            best = (i, v);
        }
    }

    let a = start + best.0.saturating_sub(1) as f64 * SAMPLE_STEP_DAYS;
    let b = start + (best.0 + 1).min(samples) as f64 * SAMPLE_STEP_DAYS;
    golden_minimum(f, a, b)
}

/// Begin and end of the phase where `g < 0`, bracketing `maximum`.
fn contacts<F: Fn(f64) -> f64>(g: F, maximum: f64, center: f64) -> Option<(f64, f64)> {
    let (lo, hi) = (center - HALF_WINDOW_DAYS, center + HALF_WINDOW_DAYS);
    if g(maximum) >= 0.0 || g(lo) < 0.0 || g(hi) < 0.0 {
        return None;
    }
    Some((bisect_root(&g, lo, maximum), bisect_root(&g, maximum, hi)))
}

/// Whether the upper limb of `body` is above the horizon at any time in
/// `[begin, end]`.
fn visible_during(body: Body, begin: f64, end: f64, geo: &GeoPosition, atm: &Atmosphere) -> bool {
    let mut t = begin;
    loop {
        if is_above_horizon(body, t, geo, atm) {
            return true;
        }
        if t >= end {
            return false;
        }
        t = (t + SAMPLE_STEP_DAYS).min(end);
    }
}

fn event_during(
    body: Body,
    event: RiseSetEvent,
    begin: f64,
    end: f64,
    geo: &GeoPosition,
    atm: &Atmosphere,
) -> Result<Option<f64>> {
    Ok(rise_trans(begin, body, event, geo, atm)?.filter(|&t| t <= end))
}

fn check_search(jd_start: f64, geo: &GeoPosition, opts: &SearchOptions) -> Result<f64> {
    EphemError::check_jd(jd_start)?;
    geo.validate()?;
    if !opts.max_years.is_finite() || opts.max_years < 0.0 {
        return Err(EphemError::InvalidDate(format!(
            "search length {} years",
            opts.max_years
        )));
    }
    Ok(jd_start + opts.max_years * 365.25)
}

/// Distance of the Moon from the shadow axis and the shadow radii, in degrees.
struct ShadowGeometry {
    distance: f64,
    umbra: f64,
    penumbra: f64,
    moon_semidiameter: f64,
}

impl ShadowGeometry {
    fn at(jd_ut: f64) -> Self {
        let sun = sun_equatorial(jd_ut);
        let moon = moon_equatorial(jd_ut);
        let antisun = EquatorialPosition {
            right_ascension: degnorm(sun.right_ascension + 180.0),
            declination: -sun.declination,
            distance_km: sun.distance_km,
        };

        let moon_parallax = horizontal_parallax(moon.distance_km);
        let sun_semidiameter = sun::semidiameter(sun.distance_km);
        let sun_parallax = sun::parallax(sun.distance_km);

        Self {
            distance: angular_separation(&antisun, &moon),
            umbra: SHADOW_ENLARGEMENT
                * (EARTH_FLATTENING_FACTOR * moon_parallax - sun_semidiameter + sun_parallax),
            penumbra: SHADOW_ENLARGEMENT
                * (EARTH_FLATTENING_FACTOR * moon_parallax + sun_semidiameter + sun_parallax),
            moon_semidiameter: moon::semidiameter(moon.distance_km),
        }
    }

    fn penumbral(&self) -> f64 {
        self.distance - (self.penumbra + self.moon_semidiameter)
    }

    fn partial(&self) -> f64 {
        self.distance - (self.umbra + self.moon_semidiameter)
    }

    fn total(&self) -> f64 {
        self.distance - (self.umbra - self.moon_semidiameter)
    }
}

/// Next lunar eclipse, ending at or after `jd_start`, during which the Moon
/// is above the horizon at `geo` for some time.
pub fn lunar_eclipse_when_loc(
    jd_start: f64,
    geo: &GeoPosition,
    opts: &SearchOptions,
) -> Result<Option<LunarEclipse>> {
    let limit = check_search(jd_start, geo, opts)?;
    let atm = &opts.atmosphere;

    let mut from = jd_start - HALF_WINDOW_DAYS;
    loop {
        let full = next_syzygy(from, Syzygy::Full)?;
        if full > limit {
            return Ok(None);
        }
        from = full + 1.0;

        if moon_position(full).latitude.abs() >= MAX_MOON_LATITUDE {
            continue;
        }

        let maximum = window_minimum(|t| ShadowGeometry::at(t).distance, full);
        let Some((penumbral_begin, penumbral_end)) =
            contacts(|t| ShadowGeometry::at(t).penumbral(), maximum, full)
        else {
            continue;
        };
        if penumbral_end < jd_start {
            continue;
        }
        if !visible_during(Body::Moon, penumbral_begin, penumbral_end, geo, atm) {
            debug!("Lunar eclipse at JD {:.4} is below the horizon", maximum);
            continue;
        }

        let partial = contacts(|t| ShadowGeometry::at(t).partial(), maximum, full);
        let total = contacts(|t| ShadowGeometry::at(t).total(), maximum, full);

        let mut flags = if total.is_some() {
            EclipseFlags::TOTAL
        } else if partial.is_some() {
            EclipseFlags::PARTIAL
        } else {
            EclipseFlags::PENUMBRAL
        };
        flags |= EclipseFlags::VISIBLE;
        if is_above_horizon(Body::Moon, maximum, geo, atm) {
            flags |= EclipseFlags::MAX_VISIBLE;
        }

        return Ok(Some(LunarEclipse {
            flags,
            maximum,
            penumbral_begin,
            penumbral_end,
            partial_begin: partial.map(|c| c.0),
            partial_end: partial.map(|c| c.1),
            total_begin: total.map(|c| c.0),
            total_end: total.map(|c| c.1),
            moonrise: event_during(
                Body::Moon,
                RiseSetEvent::Rise,
                penumbral_begin,
                penumbral_end,
                geo,
                atm,
            )?,
            moonset: event_during(
                Body::Moon,
                RiseSetEvent::Set,
                penumbral_begin,
                penumbral_end,
                geo,
                atm,
            )?,
        }));
    }
}

/// Topocentric separation of the Sun and Moon centres and their
/// semidiameters, in degrees.
fn solar_geometry(jd_ut: f64, geo: &GeoPosition) -> (f64, f64, f64) {
    let sun = topocentric(&sun_equatorial(jd_ut), jd_ut, geo);
    let moon = topocentric(&moon_equatorial(jd_ut), jd_ut, geo);
    (
        angular_separation(&sun, &moon),
        sun::semidiameter(sun.distance_km),
        moon::semidiameter(moon.distance_km),
    )
}

/// Next solar eclipse, ending at or after `jd_start`, seen from `geo` while
/// the Sun is above the horizon.
pub fn solar_eclipse_when_loc(
    jd_start: f64,
    geo: &GeoPosition,
    opts: &SearchOptions,
) -> Result<Option<SolarEclipse>> {
    let limit = check_search(jd_start, geo, opts)?;
    let atm = &opts.atmosphere;

    let outer = |t: f64| {
        let (sep, s_sun, s_moon) = solar_geometry(t, geo);
        sep - (s_sun + s_moon)
    };
    let central = |t: f64| {
        let (sep, s_sun, s_moon) = solar_geometry(t, geo);
        sep - (s_sun - s_moon).abs()
    };

    let mut from = jd_start - HALF_WINDOW_DAYS;
    loop {
        let new = next_syzygy(from, Syzygy::New)?;
        if new > limit {
            return Ok(None);
        }
        from = new + 1.0;

        if moon_position(new).latitude.abs() >= MAX_MOON_LATITUDE {
            continue;
        }

        let maximum = window_minimum(|t| solar_geometry(t, geo).0, new);
        let Some((first_contact, fourth_contact)) = contacts(&outer, maximum, new) else {
            continue;
        };
        if fourth_contact < jd_start {
            continue;
        }
        if !visible_during(Body::Sun, first_contact, fourth_contact, geo, atm) {
            debug!("Solar eclipse at JD {:.4} is below the horizon", maximum);
            continue;
        }

        let inner = contacts(&central, maximum, new);
        let (sep, s_sun, s_moon) = solar_geometry(maximum, geo);

        let mut flags = match inner {
            Some(_) if s_moon > s_sun => EclipseFlags::TOTAL,
            Some(_) => EclipseFlags::ANNULAR,
            None => EclipseFlags::PARTIAL,
        };
        flags |= EclipseFlags::VISIBLE;
        if is_above_horizon(Body::Sun, maximum, geo, atm) {
            flags |= EclipseFlags::MAX_VISIBLE;
        }

        return Ok(Some(SolarEclipse {
            flags,
            maximum,
            first_contact,
            second_contact: inner.map(|c| c.0),
            third_contact: inner.map(|c| c.1),
            fourth_contact,
            sunrise: event_during(
                Body::Sun,
                RiseSetEvent::Rise,
                first_contact,
                fourth_contact,
                geo,
                atm,
            )?,
            sunset: event_during(
                Body::Sun,
                RiseSetEvent::Set,
                first_contact,
                fourth_contact,
                geo,
                atm,
            )?,
            magnitude: (s_sun + s_moon - sep) / (2.0 * s_sun),
        }));
    }
}
