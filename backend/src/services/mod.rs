//! Service layer.
//!
//! Services sit between the city repository and the HTTP handlers. They
//! compute calendar days, resolve the observer's location and zone from the
//! user's settings, and render reports.

pub mod calendar;
pub mod email;
pub mod ephemeris;
pub mod formatter;
pub mod location;
pub mod report;
pub mod settings;

pub use calendar::{AstroCalendar, CalendarError};
pub use email::{convert_to_html, EMAIL_SUBJECT};
pub use location::LocationTimeZoneManager;
pub use report::{DayText, Report, ReportError, ReportRange, ReportService};
pub use settings::{
    AuthorizationStatus, FilePreferences, Geocoder, LocationFix, LocationProvider,
    ManualLocationProvider, MemoryPreferences, Placemark, PreferenceStore, Preferences,
    RepositoryGeocoder, Settings, SettingsError, SettingsEvent,
};
