//! Rising, setting and meridian transit times.

use crate::coords::{horizon_refraction, horizontal, hour_angle, topocentric};
use crate::error::{EphemError, Result};
use crate::moon::{self, moon_equatorial};
use crate::sun::{self, sun_equatorial};
use crate::types::{Atmosphere, Body, EquatorialPosition, GeoPosition, RiseSetEvent};

/// Length of the forward search window in days.
pub const SEARCH_WINDOW_DAYS: f64 = 2.0;
const SCAN_STEP_DAYS: f64 = 10.0 / 1440.0;
const PRECISION_DAYS: f64 = 0.5 / 86_400.0;

/// Apparent geocentric equatorial position of `body`.
pub fn geocentric_equatorial(body: Body, jd_ut: f64) -> EquatorialPosition {
    match body {
        Body::Sun => sun_equatorial(jd_ut),
        Body::Moon => moon_equatorial(jd_ut),
    }
}

/// Semidiameter of `body` in degrees at `distance_km`.
pub fn semidiameter(body: Body, distance_km: f64) -> f64 {
    match body {
        Body::Sun => sun::semidiameter(distance_km),
        Body::Moon => moon::semidiameter(distance_km),
    }
}

/// Altitude of the upper limb above the apparent horizon, in degrees.
///
/// Zero at the instant of rising or setting; positive while the body is up.
pub fn apparent_upper_limb_altitude(
    body: Body,
    jd_ut: f64,
    geo: &GeoPosition,
    atm: &Atmosphere,
) -> f64 {
    let topo = topocentric(&geocentric_equatorial(body, jd_ut), jd_ut, geo);
    let altitude = horizontal(&topo, jd_ut, geo).altitude;
    altitude + horizon_refraction(atm) + semidiameter(body, topo.distance_km)
}

/// Whether the upper limb of `body` is above the horizon at `jd_ut`.
pub fn is_above_horizon(body: Body, jd_ut: f64, geo: &GeoPosition, atm: &Atmosphere) -> bool {
    apparent_upper_limb_altitude(body, jd_ut, geo, atm) > 0.0
}

fn bisect<F>(mut lo: f64, mut hi: f64, f: F) -> f64
where
    F: Fn(f64) -> bool,
{
    // f(lo) is false and f(hi) is true. Returning hi keeps the result on
    // the post-event side, so a search restarted from it finds the next one.
    while hi - lo > PRECISION_DAYS {
        let mid = 0.5 * (lo + hi);
        if f(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}

/// First rise, set or upper transit of `body` strictly after `jd_ut`.
///
/// Returns `Ok(None)` when the event does not occur within
/// [`SEARCH_WINDOW_DAYS`], e.g. for a circumpolar body.
pub fn rise_trans(
    jd_ut: f64,
    body: Body,
    event: RiseSetEvent,
    geo: &GeoPosition,
    atm: &Atmosphere,
) -> Result<Option<f64>> {
    EphemError::check_jd(jd_ut)?;
    geo.validate()?;

    let value = |jd: f64| -> f64 {
        match event {
            RiseSetEvent::Rise | RiseSetEvent::Set => {
                apparent_upper_limb_altitude(body, jd, geo, atm)
            }
            RiseSetEvent::Transit => {
                let topo = topocentric(&geocentric_equatorial(body, jd), jd, geo);
                hour_angle(&topo, jd, geo)
            }
        }
    };
    // Sign pattern the event produces between two samples.
    let crossed = |before: f64, after: f64| -> bool {
        match event {
            RiseSetEvent::Rise => before <= 0.0 && after > 0.0,
            RiseSetEvent::Set => before > 0.0 && after <= 0.0,
            RiseSetEvent::Transit => before < 0.0 && before > -90.0 && after >= 0.0 && after < 90.0,
        }
    };
    let past = |v: f64| -> bool {
        match event {
            RiseSetEvent::Rise => v > 0.0,
            RiseSetEvent::Set => v <= 0.0,
            RiseSetEvent::Transit => v >= 0.0,
        }
    };

    let end = jd_ut + SEARCH_WINDOW_DAYS;
    let mut t0 = jd_ut;
    let mut v0 = value(t0);
    while t0 < end {
        let t1 = t0 + SCAN_STEP_DAYS;
        let v1 = value(t1);
        if crossed(v0, v1) {
            let jd = bisect(t0, t1, |t| past(value(t)));
            if jd > jd_ut {
                return Ok(Some(jd));
            }
        }
        t0 = t1;
        v0 = v1;
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::julian_day;
    use crate::types::CalendarKind;

    fn jd(y: i32, mo: u32, d: u32, h: f64) -> f64 {
        julian_day(y, mo, d, h, CalendarKind::Gregorian)
    }

    fn london() -> GeoPosition {
        GeoPosition::new(-0.1278, 51.5074, 11.0)
    }

    const THREE_MINUTES: f64 = 3.0 / 1440.0;

    #[test]
    fn test_london_midsummer_sun() {
        let start = jd(2015, 6, 21, 0.0);
        let atm = Atmosphere::default();

        let rise = rise_trans(start, Body::Sun, RiseSetEvent::Rise, &london(), &atm)
            .unwrap()
            .unwrap();
        assert!((rise - jd(2015, 6, 21, 3.0 + 43.0 / 60.0)).abs() < THREE_MINUTES);

        let set = rise_trans(start, Body::Sun, RiseSetEvent::Set, &london(), &atm)
            .unwrap()
            .unwrap();
        assert!((set - jd(2015, 6, 21, 20.0 + 21.0 / 60.0)).abs() < THREE_MINUTES);

        let transit = rise_trans(start, Body::Sun, RiseSetEvent::Transit, &london(), &atm)
            .unwrap()
            .unwrap();
        assert!(transit > rise && transit < set);
        assert!((transit - jd(2015, 6, 21, 12.0 + 3.0 / 60.0)).abs() < THREE_MINUTES);
    }

    #[test]
    fn test_event_is_strictly_after_start() {
        let atm = Atmosphere::default();
        let start = jd(2015, 6, 21, 0.0);
        let rise = rise_trans(start, Body::Sun, RiseSetEvent::Rise, &london(), &atm)
            .unwrap()
            .unwrap();
        let next = rise_trans(rise, Body::Sun, RiseSetEvent::Rise, &london(), &atm)
            .unwrap()
            .unwrap();
        assert!(next - rise > 0.99 && next - rise < 1.01);
    }

    #[test]
    fn test_returned_instant_is_past_the_event() {
        let atm = Atmosphere::default();
        let start = jd(2015, 6, 21, 0.0);
        let rise = rise_trans(start, Body::Sun, RiseSetEvent::Rise, &london(), &atm)
            .unwrap()
            .unwrap();
        assert!(is_above_horizon(Body::Sun, rise, &london(), &atm));

        let set = rise_trans(start, Body::Sun, RiseSetEvent::Set, &london(), &atm)
            .unwrap()
            .unwrap();
        assert!(!is_above_horizon(Body::Sun, set, &london(), &atm));
        let next_set = rise_trans(set, Body::Sun, RiseSetEvent::Set, &london(), &atm)
            .unwrap()
            .unwrap();
        assert!(next_set - set > 0.99);

        let transit = rise_trans(start, Body::Sun, RiseSetEvent::Transit, &london(), &atm)
            .unwrap()
            .unwrap();
        let next_transit = rise_trans(transit, Body::Sun, RiseSetEvent::Transit, &london(), &atm)
            .unwrap()
            .unwrap();
        assert!(next_transit - transit > 0.99);
    }

    #[test]
    fn test_midnight_sun_has_no_set() {
        // Tromsø in late June
        let geo = GeoPosition::new(18.96, 69.65, 0.0);
        let set = rise_trans(
            jd(2015, 6, 21, 0.0),
            Body::Sun,
            RiseSetEvent::Set,
            &geo,
            &Atmosphere::default(),
        )
        .unwrap();
        assert!(set.is_none());
    }

    #[test]
    fn test_moon_rises_and_sets_within_window() {
        let atm = Atmosphere::default();
        let start = jd(2015, 7, 10, 0.0);
        let rise = rise_trans(start, Body::Moon, RiseSetEvent::Rise, &london(), &atm).unwrap();
        let set = rise_trans(start, Body::Moon, RiseSetEvent::Set, &london(), &atm).unwrap();
        let (rise, set) = (rise.unwrap(), set.unwrap());
        assert!(rise > start && rise < start + 1.2);
        assert!(set > start && set < start + 1.2);
        assert!(apparent_upper_limb_altitude(Body::Moon, rise, &london(), &atm).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_location_is_rejected() {
        let geo = GeoPosition::new(0.0, 95.0, 0.0);
        let err = rise_trans(
            jd(2015, 6, 21, 0.0),
            Body::Sun,
            RiseSetEvent::Rise,
            &geo,
            &Atmosphere::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EphemError::InvalidLocation(_)));
    }
}
