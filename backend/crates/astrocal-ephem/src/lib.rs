//! # astrocal-ephem
//!
//! Sun and Moon ephemeris for calendar use.
//!
//! This crate computes apparent positions of the Sun and Moon from
//! low-precision analytical theories and builds the events a calendar
//! needs on top of them:
//!
//! - Julian day and ΔT conversions
//! - Rise, set and meridian transit times for an observer
//! - Lunar phase angle, illuminated fraction and phase instants
//! - Local circumstances of lunar and solar eclipses
//!
//! Accuracy is around 0.01°, which gives rise/set and contact times to
//! within a minute or so.
//!
//! ## Example
//!
//! ```rust,ignore
//! use astrocal_ephem::{julian_day, rise_trans, Atmosphere, Body, CalendarKind, GeoPosition, RiseSetEvent};
//!
//! let london = GeoPosition::new(-0.1278, 51.5074, 11.0);
//! let start = julian_day(2015, 6, 21, 0.0, CalendarKind::Gregorian);
//! let sunrise = rise_trans(start, Body::Sun, RiseSetEvent::Rise, &london, &Atmosphere::default())?;
//! ```

pub mod coords;
pub mod eclipse;
mod error;
pub mod moon;
pub mod phenomena;
pub mod rise_set;
pub mod sun;
pub mod time;
mod types;

pub use eclipse::{lunar_eclipse_when_loc, solar_eclipse_when_loc, SearchOptions};
pub use error::{EphemError, Result};
pub use moon::moon_position;
pub use phenomena::{elongation_angle, illuminated_fraction, next_syzygy, phase_angle, Syzygy};
pub use rise_set::{apparent_upper_limb_altitude, rise_trans};
pub use sun::sun_position;
pub use time::{delta_t, julian_day, julian_day_to_utc};
pub use types::*;

/// Version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
