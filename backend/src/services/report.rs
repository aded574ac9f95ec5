//! Week and month reports plus the single-day view.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::calendar::{AstroCalendar, CalendarError};
use super::formatter::{add_days, add_months, date_f, time_f};
use super::settings::{Settings, SettingsError, SettingsEvent};
use crate::models::{CalendarDay, Location, VisibleEclipse};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("date out of range: {0}")]
    DateOutOfRange(NaiveDate),

    #[error("calendar task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Length of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportRange {
    #[default]
    Week,
    Month,
}

impl ReportRange {
    /// Last day covered by a report starting on `from`.
    pub fn end(self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            ReportRange::Week => add_days(from, 6),
            ReportRange::Month => add_months(from, 1),
        }
    }
}

impl FromStr for ReportRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(format!("Unknown report range: {}", s)),
        }
    }
}

impl fmt::Display for ReportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportRange::Week => f.write_str("week"),
            ReportRange::Month => f.write_str("month"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// `"DD-MM-YYYY\nDD-MM-YYYY"`
    pub range_label: String,
    pub location_label: String,
    pub days: Vec<CalendarDay>,
}

/// One day rendered as display text. Missing times read `"--"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayText {
    pub date: String,
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub phase_name: String,
    pub phase: String,
    pub eclipse: String,
}

impl DayText {
    /// Text for a row of a report.
    pub fn row(day: &CalendarDay) -> Self {
        Self::render(day, eclipse_text)
    }

    /// Text for the single-day view.
    pub fn day_view(day: &CalendarDay) -> Self {
        Self::render(day, day_eclipse_text)
    }

    fn render(day: &CalendarDay, eclipse: fn(&VisibleEclipse) -> String) -> Self {
        Self {
            date: date_f(&day.date),
            sunrise: time_or_dashes(day.sunrise.as_ref()),
            sunset: time_or_dashes(day.sunset.as_ref()),
            moonrise: time_or_dashes(day.moonrise.as_ref()),
            moonset: time_or_dashes(day.moonset.as_ref()),
            phase_name: day.phase_name.to_string(),
            phase: phase_text(day.phase),
            eclipse: day.eclipse.as_ref().map(eclipse).unwrap_or_default(),
        }
    }
}

pub(crate) fn time_or_dashes(t: Option<&chrono::NaiveDateTime>) -> String {
    t.map(time_f).unwrap_or_else(|| "--".to_string())
}

/// `"Total Lunar eclipse visible starting at: 03:16:09"`
pub fn eclipse_text(e: &VisibleEclipse) -> String {
    format!(
        "{} {} eclipse visible starting at: {}",
        e.visibility,
        e.body,
        time_f(&e.visible_at)
    )
}

/// [`eclipse_text`] followed by `", today."`
pub fn day_eclipse_text(e: &VisibleEclipse) -> String {
    format!("{}, today.", eclipse_text(e))
}

/// Illumination as `"12.34%"`.
pub fn phase_text(phase: f64) -> String {
    format!("{:.2}%", phase)
}

/// Builds reports from the current settings.
///
/// The calendar is shared so a settings change can drop days computed for
/// the old location.
pub struct ReportService {
    settings: Arc<Settings>,
    calendar: Arc<Mutex<AstroCalendar>>,
}

impl ReportService {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            calendar: Arc::new(Mutex::new(AstroCalendar::default())),
        }
    }

    pub fn with_calendar(settings: Arc<Settings>, calendar: AstroCalendar) -> Self {
        Self {
            settings,
            calendar: Arc::new(Mutex::new(calendar)),
        }
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Days held by the calendar from the last computation.
    pub fn cached_days(&self) -> Vec<CalendarDay> {
        self.calendar.lock().to_array()
    }

    /// Compute `range` starting on `from` for the current settings.
    pub async fn build(&self, from: NaiveDate, range: ReportRange) -> Result<Report> {
        let to = range.end(from).ok_or(ReportError::DateOutOfRange(from))?;
        let location = self.settings.location().await?;
        let days = self.fetch(from, to, location.clone()).await?;

        info!(
            "Built {} report for {} from {} ({} days)",
            range,
            location.display_name(),
            from,
            days.len()
        );

        Ok(Report {
            from,
            to,
            range_label: format!("{}\n{}", date_f(&from), date_f(&to)),
            location_label: location.display_name(),
            days,
        })
    }

    /// Compute a single day for the current settings.
    pub async fn day(&self, date: NaiveDate) -> Result<(Location, CalendarDay)> {
        let location = self.settings.location().await?;
        let mut days = self.fetch(date, date, location.clone()).await?;
        let day = days.pop().ok_or(ReportError::DateOutOfRange(date))?;
        Ok((location, day))
    }

    async fn fetch(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        location: Location,
    ) -> Result<Vec<CalendarDay>> {
        let timezone = self.settings.timezone().await?;
        let calendar = Arc::clone(&self.calendar);

        let days = tokio::task::spawn_blocking(move || {
            let mut calendar = calendar.lock();
            calendar.set_time_zone(timezone);
            calendar.set_location(location);
            calendar.fetch_events(from, to)
        })
        .await??;
        Ok(days)
    }

    /// Pick up new settings and drop days computed for the old ones.
    pub async fn act_on_location_update(&self) -> Result<()> {
        let timezone = self.settings.timezone().await?;
        let location = self.settings.location().await?;
        debug!(
            "Settings changed: {} in {}",
            location.display_name(),
            timezone
        );

        // The calendar lock may be held by a running fetch.
        let calendar = Arc::clone(&self.calendar);
        tokio::task::spawn_blocking(move || {
            let mut calendar = calendar.lock();
            calendar.set_time_zone(timezone);
            calendar.set_location(location);
            calendar.clear();
        })
        .await?;
        Ok(())
    }

    /// Run [`Self::act_on_location_update`] on every settings update until
    /// the settings are dropped.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.settings.subscribe();
        let service = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SettingsEvent::Updated) => {
                        let Some(service) = service.upgrade() else {
                            break;
                        };
                        if let Err(e) = service.act_on_location_update().await {
                            warn!("Failed to apply settings update: {}", e);
                        }
                    }
                    Ok(SettingsEvent::GpsTimeout(msg))
                    | Ok(SettingsEvent::PermissionDenied(msg)) => info!("{}", msg),
                    Err(RecvError::Lagged(n)) => debug!("Skipped {} settings events", n),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EclipseBody, MoonPhaseName};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_day() -> CalendarDay {
        let d = date(2015, 4, 4);
        CalendarDay {
            date: d.and_hms_opt(0, 0, 0).unwrap(),
            sunrise: Some(d.and_hms_opt(6, 35, 2).unwrap()),
            sunset: Some(d.and_hms_opt(19, 41, 30).unwrap()),
            moonrise: None,
            moonset: Some(d.and_hms_opt(6, 50, 0).unwrap()),
            phase_name: MoonPhaseName::FullMoon,
            phase: 99.987,
            eclipse: Some(VisibleEclipse {
                visible_at: d.and_hms_opt(3, 16, 9).unwrap(),
                body: EclipseBody::Lunar,
                visibility: "Total".into(),
            }),
        }
    }

    #[tokio::test]
    async fn test_location_update_clears_days() {
        let repo: Arc<dyn crate::db::CityRepository> =
            Arc::new(crate::db::LocalRepository::with_defaults());
        let settings = Arc::new(Settings::new(
            Box::new(crate::services::MemoryPreferences::default()),
            crate::services::LocationTimeZoneManager::new(Arc::clone(&repo)),
            Arc::new(crate::services::ManualLocationProvider::new(
                crate::services::AuthorizationStatus::Denied,
            )),
            Arc::new(crate::services::RepositoryGeocoder::new(repo)),
        ));
        settings.set_city_name("tokyo").unwrap();
        let reports = ReportService::new(settings);

        reports.build(date(2015, 6, 1), ReportRange::Week).await.unwrap();
        assert_eq!(reports.cached_days().len(), 7);

        reports.act_on_location_update().await.unwrap();
        assert!(reports.cached_days().is_empty());
        let calendar = reports.calendar.lock();
        assert_eq!(calendar.time_zone(), chrono_tz::Asia::Tokyo);
        assert_eq!(calendar.location().city.as_deref(), Some("tokyo"));
    }

    #[test]
    fn test_range_end() {
        assert_eq!(ReportRange::Week.end(date(2015, 4, 27)), Some(date(2015, 5, 3)));
        assert_eq!(ReportRange::Month.end(date(2015, 1, 31)), Some(date(2015, 2, 28)));
        assert_eq!("Month".parse::<ReportRange>().unwrap(), ReportRange::Month);
        assert!("year".parse::<ReportRange>().is_err());
    }

    #[test]
    fn test_texts() {
        let day = sample_day();
        let e = day.eclipse.as_ref().unwrap();
        assert_eq!(
            eclipse_text(e),
            "Total Lunar eclipse visible starting at: 03:16:09"
        );
        assert_eq!(
            day_eclipse_text(e),
            "Total Lunar eclipse visible starting at: 03:16:09, today."
        );
        assert_eq!(phase_text(99.987), "99.99%");
        assert_eq!(phase_text(0.0), "0.00%");
    }

    #[test]
    fn test_day_text() {
        let row = DayText::row(&sample_day());
        assert_eq!(row.date, "04-04-2015");
        assert_eq!(row.sunrise, "06:35:02");
        assert_eq!(row.moonrise, "--");
        assert_eq!(row.phase_name, "Full Moon");
        assert!(!row.eclipse.ends_with("today."));

        let view = DayText::day_view(&sample_day());
        assert!(view.eclipse.ends_with(", today."));

        let mut plain = sample_day();
        plain.eclipse = None;
        assert_eq!(DayText::row(&plain).eclipse, "");
    }
}
