//! Phase, elongation and lunar phase instants.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{EphemError, Result};
use crate::moon::moon_position;
use crate::sun::sun_position;
use crate::time::{difdeg2n, difdegn};
use crate::types::{Body, EclipticPosition};

/// Mean motion of the Moon relative to the Sun in degrees per day.
pub const SYNODIC_RATE: f64 = 360.0 / 29.530_588_853;

const MAX_ITERATIONS: usize = 50;
const CONVERGENCE_DAYS: f64 = 1e-7;

/// Lunar phase instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Syzygy {
    New,
    FirstQuarter,
    Full,
    LastQuarter,
}

impl Syzygy {
    /// Elongation of the Moon from the Sun at this phase, in degrees.
    pub fn elongation(self) -> f64 {
        match self {
            Syzygy::New => 0.0,
            Syzygy::FirstQuarter => 90.0,
            Syzygy::Full => 180.0,
            Syzygy::LastQuarter => 270.0,
        }
    }
}

fn position(body: Body, jd_ut: f64) -> EclipticPosition {
    match body {
        Body::Sun => sun_position(jd_ut),
        Body::Moon => moon_position(jd_ut),
    }
}

/// Sun–body–Earth angle in degrees. Zero for the Sun itself.
pub fn phase_angle(jd_ut: f64, body: Body) -> Result<f64> {
    EphemError::check_jd(jd_ut)?;
    match body {
        Body::Sun => Ok(0.0),
        Body::Moon => {
            let sun = sun_position(jd_ut);
            let moon = moon_position(jd_ut);
            let beta = moon.latitude.to_radians();
            let dlon = (moon.longitude - sun.longitude).to_radians();
            let psi = (beta.cos() * dlon.cos()).clamp(-1.0, 1.0).acos();

            let r = sun.distance_km;
            let delta = moon.distance_km;
            Ok((r * psi.sin()).atan2(delta - r * psi.cos()).to_degrees())
        }
    }
}

/// Illuminated fraction of the disk in `[0, 1]`.
pub fn illuminated_fraction(jd_ut: f64, body: Body) -> Result<f64> {
    let i = phase_angle(jd_ut, body)?.to_radians();
    Ok((1.0 + i.cos()) / 2.0)
}

/// Apparent ecliptic longitude of `target` minus that of `comparison`,
/// in `[0, 360)`.
pub fn elongation_angle(jd_ut: f64, target: Body, comparison: Body) -> Result<f64> {
    EphemError::check_jd(jd_ut)?;
    Ok(difdegn(
        position(target, jd_ut).longitude,
        position(comparison, jd_ut).longitude,
    ))
}

/// First instant strictly after `jd_ut` at which the Moon reaches `phase`.
pub fn next_syzygy(jd_ut: f64, phase: Syzygy) -> Result<f64> {
    EphemError::check_jd(jd_ut)?;

    let target = phase.elongation();
    let now = elongation_angle(jd_ut, Body::Moon, Body::Sun)?;
    let mut ahead = difdegn(target, now);
    if ahead < 1e-9 {
        ahead = 360.0;
    }

    let mut jd = jd_ut + ahead / SYNODIC_RATE;
    for iteration in 0..MAX_ITERATIONS {
        let elong = elongation_angle(jd, Body::Moon, Body::Sun)?;
        let step = difdeg2n(target, elong) / SYNODIC_RATE;
        jd += step;
        if step.abs() < CONVERGENCE_DAYS {
            debug!(
                "{:?} at JD {:.6} after {} iterations",
                phase,
                jd,
                iteration + 1
            );
            return Ok(jd);
        }
    }

    Err(EphemError::NoConvergence(format!(
        "{:?} search from JD {}",
        phase, jd_ut
    )))
}
