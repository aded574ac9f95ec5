//! Data Transfer Objects for the HTTP API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::CityRecord;
use crate::models::{CalendarDay, Location};
use crate::services::{DayText, LocationFix, Report, ReportRange};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// City database status
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationListResponse {
    pub locations: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub city: String,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
    /// IANA zone name
    pub timezone: String,
    pub label: String,
}

impl From<CityRecord> for LocationResponse {
    fn from(record: CityRecord) -> Self {
        let label = record.to_location().display_name();
        Self {
            city: record.city,
            longitude: record.longitude,
            latitude: record.latitude,
            elevation: record.elevation,
            timezone: record.timezone,
            label,
        }
    }
}

/// Current settings as the settings screen shows them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub city: String,
    pub gps: bool,
    /// Capitalised name of the active location
    pub location: String,
    pub longitude: f64,
    pub latitude: f64,
    pub timezone: String,
    /// Whether a GPS fix is still awaited
    pub updating_location: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub gps: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsFixRequest {
    pub fixes: Vec<LocationFix>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsFixResponse {
    /// False when the fix was ignored (GPS off or too inaccurate)
    pub accepted: bool,
    pub location: String,
}

/// `?date=YYYY-MM-DD`, defaulting to today in the user's zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// `?date=YYYY-MM-DD&range=week|month`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub range: Option<ReportRange>,
}

/// Single-day view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayResponse {
    pub location: String,
    pub day: CalendarDay,
    pub text: DayText,
}

impl DayResponse {
    pub fn new(location: &Location, day: CalendarDay) -> Self {
        Self {
            location: location.display_name(),
            text: DayText::day_view(&day),
            day,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub range_label: String,
    pub location_label: String,
    pub days: Vec<CalendarDay>,
    /// Display text per day, in the same order as `days`
    pub rows: Vec<DayText>,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        let rows = report.days.iter().map(DayText::row).collect();
        Self {
            from: report.from,
            to: report.to,
            range_label: report.range_label,
            location_label: report.location_label,
            days: report.days,
            rows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailResponse {
    pub subject: String,
    pub html: String,
}
