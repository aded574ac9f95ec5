//! # AstroCalendar backend
//!
//! Sun and Moon calendar for any city or GPS position: rise and set times,
//! lunar phases and visible eclipses, with week and month reports.
//!
//! ## Architecture
//!
//! - [`ephemeris`]: the `astrocal-ephem` crate (positions, rise/set,
//!   phenomena, eclipses)
//! - [`sqlite`]: the embedded SQLite bindings backing the city list
//! - [`time`]: `chrono`/`chrono_tz` and local/UTC conversions
//! - [`db`]: city repository trait and its SQLite and in-memory backends
//! - [`models`]: locations, calendar days and eclipses
//! - [`services`]: calendar, settings, reports and email rendering
//! - [`config`]: `astrocal.toml` plus environment overrides
//! - [`http`]: Axum REST API (feature `http-server`)

// RepositoryError carries an ErrorContext for debugging.
#![allow(clippy::result_large_err)]

pub use astrocal_ephem as ephemeris;
#[cfg(feature = "sqlite-repo")]
pub use rusqlite as sqlite;

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod time;

#[cfg(feature = "http-server")]
pub mod http;
