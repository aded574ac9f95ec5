//! Typed access to the ephemeris crate in terms of `DateTime<Utc>`.

use chrono::{DateTime, Utc};

use astrocal_ephem::rise_set::is_above_horizon;
use astrocal_ephem::time::{julian_day_from_unix, unix_from_julian_day};
use astrocal_ephem::{
    elongation_angle, illuminated_fraction, lunar_eclipse_when_loc, rise_trans,
    solar_eclipse_when_loc, Atmosphere, Body, EclipseKind, EphemError, GeoPosition,
    RiseSetEvent, SearchOptions,
};

use crate::models::{Eclipse, EclipseBody, Location};

pub type Result<T> = std::result::Result<T, EphemError>;

/// Julian day (UT) of an instant.
pub fn julian_day(utc: DateTime<Utc>) -> f64 {
    let seconds = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9;
    julian_day_from_unix(seconds)
}

/// Instant of a Julian day (UT), truncated to whole seconds.
pub fn from_julian_day(jd: f64) -> Result<DateTime<Utc>> {
    if !jd.is_finite() {
        return Err(EphemError::InvalidDate(format!("Julian day {}", jd)));
    }
    // Round to the millisecond first so that exact seconds survive float error.
    let millis = (unix_from_julian_day(jd) * 1000.0).round();
    let seconds = (millis / 1000.0).floor() as i64;
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| EphemError::InvalidDate(format!("Julian day {} out of range", jd)))
}

/// Next rise, set or transit of `body` after `utc`, using the standard
/// atmosphere (1015 mbar, 15 °C).
pub fn rise_set_transit(
    body: Body,
    event: RiseSetEvent,
    location: &Location,
    utc: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let geo = location.to_geo();
    rise_trans(julian_day(utc), body, event, &geo, &Atmosphere::default())?
        .map(from_julian_day)
        .transpose()
}

/// Illuminated fraction of `body` in `[0, 1]`.
pub fn phase(body: Body, utc: DateTime<Utc>) -> Result<f64> {
    illuminated_fraction(julian_day(utc), body)
}

/// Ecliptic longitude of `target` minus that of `comparison`, `[0, 360)`.
pub fn phase_angle(target: Body, comparison: Body, utc: DateTime<Utc>) -> Result<f64> {
    elongation_angle(julian_day(utc), target, comparison)
}

/// Collect the stage times that exist and at which `body` is up, plus the
/// body's rise and set inside the eclipse.
fn viewing_stages(
    body: Body,
    geo: &GeoPosition,
    atm: &Atmosphere,
    stages: &[Option<f64>],
    horizon_events: &[Option<f64>],
) -> Result<Vec<DateTime<Utc>>> {
    let mut times: Vec<f64> = stages
        .iter()
        .flatten()
        .copied()
        .filter(|&jd| is_above_horizon(body, jd, geo, atm))
        .collect();
    times.extend(horizon_events.iter().flatten().copied());
    times.sort_by(|a, b| a.total_cmp(b));

    let mut out = Vec::with_capacity(times.len());
    for jd in times {
        let t = from_julian_day(jd)?;
        if out.last() != Some(&t) {
            out.push(t);
        }
    }
    Ok(out)
}

fn visibility(kind: Option<EclipseKind>) -> String {
    kind.map(|k| k.as_str().to_string()).unwrap_or_default()
}

/// Next eclipse of the given kind visible from `location`, searching from
/// `utc`.
pub fn find_next_eclipse(
    body: EclipseBody,
    utc: DateTime<Utc>,
    location: &Location,
) -> Result<Option<Eclipse>> {
    let geo = location.to_geo();
    let opts = SearchOptions::default();
    let jd = julian_day(utc);

    let eclipse = match body {
        EclipseBody::Lunar => match lunar_eclipse_when_loc(jd, &geo, &opts)? {
            Some(e) => Eclipse {
                viewing_stages: viewing_stages(
                    Body::Moon,
                    &geo,
                    &opts.atmosphere,
                    &[
                        e.partial_begin,
                        e.total_begin,
                        Some(e.maximum),
                        e.total_end,
                        e.partial_end,
                    ],
                    &[e.moonrise, e.moonset],
                )?,
                body,
                visibility: visibility(e.kind()),
            },
            None => return Ok(None),
        },
        EclipseBody::Solar => match solar_eclipse_when_loc(jd, &geo, &opts)? {
            Some(e) => Eclipse {
                viewing_stages: viewing_stages(
                    Body::Sun,
                    &geo,
                    &opts.atmosphere,
                    &[
                        Some(e.first_contact),
                        e.second_contact,
                        Some(e.maximum),
                        e.third_contact,
                        Some(e.fourth_contact),
                    ],
                    &[e.sunrise, e.sunset],
                )?,
                body,
                visibility: visibility(e.kind()),
            },
            None => return Ok(None),
        },
    };

    Ok(Some(eclipse))
}
