//! Day-by-day Sun and Moon events for a location and time zone.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use log::debug;
use thiserror::Error;

use astrocal_ephem::{Body, EphemError, RiseSetEvent};

use super::ephemeris;
use crate::models::{CalendarDay, Eclipse, EclipseBody, Location, MoonPhaseName, VisibleEclipse};
use crate::time::{local_midnight, local_to_utc, utc_to_local};

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("ephemeris error: {0}")]
    Ephemeris(#[from] EphemError),

    #[error("invalid date: {0}")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, CalendarError>;

/// Result of the last eclipse search for one body.
#[derive(Debug, Clone)]
struct EclipseMemo {
    searched_from: DateTime<Utc>,
    eclipse: Option<Eclipse>,
}

impl EclipseMemo {
    /// Whether a search from `utc` would find the same eclipse.
    fn covers(&self, utc: DateTime<Utc>) -> bool {
        if utc < self.searched_from {
            return false;
        }
        match &self.eclipse {
            Some(e) => e.last_stage().is_some_and(|last| utc <= last),
            None => utc == self.searched_from,
        }
    }
}

/// Builds [`CalendarDay`]s for a location and time zone.
#[derive(Debug, Clone)]
pub struct AstroCalendar {
    timezone: Tz,
    location: Location,
    days: Vec<CalendarDay>,
    eclipses: HashMap<EclipseBody, EclipseMemo>,
}

impl Default for AstroCalendar {
    /// Kelowna in Pacific time.
    fn default() -> Self {
        Self::new(chrono_tz::America::Vancouver, Location::kelowna())
    }
}

impl AstroCalendar {
    pub fn new(timezone: Tz, location: Location) -> Self {
        Self {
            timezone,
            location,
            days: Vec::new(),
            eclipses: HashMap::new(),
        }
    }

    /// Compute one day per local date in `start..=end`.
    ///
    /// The result also replaces the stored days (see [`Self::to_array`]).
    pub fn fetch_events(&mut self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CalendarDay>> {
        let mut days = Vec::new();
        let mut date = start;
        while date <= end {
            days.push(self.day(date)?);
            date = date
                .succ_opt()
                .ok_or_else(|| CalendarError::InvalidDate(format!("no day after {}", date)))?;
        }
        debug!(
            "Computed {} days from {} to {} for {:?}",
            days.len(),
            start,
            end,
            self.location.city
        );
        self.days = days.clone();
        Ok(days)
    }

    fn day(&mut self, date: NaiveDate) -> Result<CalendarDay> {
        let local = local_midnight(date);
        let next = date
            .succ_opt()
            .ok_or_else(|| CalendarError::InvalidDate(format!("no day after {}", date)))?;
        let utc = local_to_utc(&self.timezone, local);
        let utc_plus_24 = local_to_utc(&self.timezone, local_midnight(next));

        let angle_start = ephemeris::phase_angle(Body::Moon, Body::Sun, utc)?;
        let angle_next = ephemeris::phase_angle(Body::Moon, Body::Sun, utc_plus_24)?;

        Ok(CalendarDay {
            date: local,
            sunrise: self.event_on(Body::Sun, RiseSetEvent::Rise, utc, date)?,
            sunset: self.event_on(Body::Sun, RiseSetEvent::Set, utc, date)?,
            moonrise: self.event_on(Body::Moon, RiseSetEvent::Rise, utc, date)?,
            moonset: self.event_on(Body::Moon, RiseSetEvent::Set, utc, date)?,
            phase_name: MoonPhaseName::from_angles(angle_start, angle_next),
            phase: ephemeris::phase(Body::Moon, utc)? * 100.0,
            eclipse: self.eclipse_for_today(utc, date)?,
        })
    }

    /// Next `event` after `utc` in local time, kept only when it falls on
    /// local `date`.
    fn event_on(
        &self,
        body: Body,
        event: RiseSetEvent,
        utc: DateTime<Utc>,
        date: NaiveDate,
    ) -> Result<Option<NaiveDateTime>> {
        let found = ephemeris::rise_set_transit(body, event, &self.location, utc)?;
        Ok(found
            .map(|t| utc_to_local(&self.timezone, t))
            .filter(|t| t.date() == date))
    }

    /// A lunar eclipse seen on `date` if there is one, otherwise a solar one.
    fn eclipse_for_today(
        &mut self,
        utc: DateTime<Utc>,
        date: NaiveDate,
    ) -> Result<Option<VisibleEclipse>> {
        for body in [EclipseBody::Lunar, EclipseBody::Solar] {
            if let Some(visible) = self.eclipse_on(body, utc, date)? {
                return Ok(Some(visible));
            }
        }
        Ok(None)
    }

    /// The first viewing stage of the next eclipse that falls on local `date`.
    fn eclipse_on(
        &mut self,
        body: EclipseBody,
        utc: DateTime<Utc>,
        date: NaiveDate,
    ) -> Result<Option<VisibleEclipse>> {
        let Some(eclipse) = self.next_eclipse(body, utc)? else {
            return Ok(None);
        };

        Ok(eclipse
            .viewing_stages
            .iter()
            .map(|&stage| utc_to_local(&self.timezone, stage))
            .find(|local| local.date() == date)
            .map(|visible_at| VisibleEclipse {
                visible_at,
                body: eclipse.body,
                visibility: eclipse.visibility.clone(),
            }))
    }

    fn next_eclipse(&mut self, body: EclipseBody, utc: DateTime<Utc>) -> Result<Option<Eclipse>> {
        if let Some(memo) = self.eclipses.get(&body) {
            if memo.covers(utc) {
                return Ok(memo.eclipse.clone());
            }
        }

        debug!("Searching next {} eclipse from {}", body, utc);
        let eclipse = ephemeris::find_next_eclipse(body, utc, &self.location)?;
        self.eclipses.insert(
            body,
            EclipseMemo {
                searched_from: utc,
                eclipse: eclipse.clone(),
            },
        );
        Ok(eclipse)
    }

    /// Convert between naive local time and naive UTC in this calendar's zone.
    ///
    /// With `to_local` the input is read as UTC, otherwise as local time.
    /// See [`local_to_utc`] for how gaps and repeated hours resolve.
    pub fn to_time_zone(&self, date: NaiveDateTime, to_local: bool) -> NaiveDateTime {
        if to_local {
            utc_to_local(&self.timezone, date.and_utc())
        } else {
            local_to_utc(&self.timezone, date).naive_utc()
        }
    }

    pub fn set_time_zone(&mut self, timezone: Tz) {
        self.timezone = timezone;
    }

    pub fn time_zone(&self) -> Tz {
        self.timezone
    }

    /// Change the observer. Cached eclipse searches are dropped.
    pub fn set_location(&mut self, location: Location) {
        if location != self.location {
            self.eclipses.clear();
        }
        self.location = location;
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Days produced by the last [`Self::fetch_events`].
    pub fn to_array(&self) -> Vec<CalendarDay> {
        self.days.clone()
    }

    /// Forget the stored days.
    pub fn clear(&mut self) {
        self.days.clear();
    }
}
