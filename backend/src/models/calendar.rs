use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named phase of the Moon over one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonPhaseName {
    #[serde(rename = "New Moon")]
    NewMoon,
    #[serde(rename = "First Quarter")]
    FirstQuarter,
    #[serde(rename = "Full Moon")]
    FullMoon,
    #[serde(rename = "Third Quarter")]
    ThirdQuarter,
    #[serde(rename = "Waxing Crescent")]
    WaxingCrescent,
    #[serde(rename = "Waxing Gibbous")]
    WaxingGibbous,
    #[serde(rename = "Waning Gibbous")]
    WaningGibbous,
    #[serde(rename = "Waning Crescent")]
    WaningCrescent,
    Unknown,
}

impl MoonPhaseName {
    pub fn as_str(self) -> &'static str {
        match self {
            MoonPhaseName::NewMoon => "New Moon",
            MoonPhaseName::FirstQuarter => "First Quarter",
            MoonPhaseName::FullMoon => "Full Moon",
            MoonPhaseName::ThirdQuarter => "Third Quarter",
            MoonPhaseName::WaxingCrescent => "Waxing Crescent",
            MoonPhaseName::WaxingGibbous => "Waxing Gibbous",
            MoonPhaseName::WaningGibbous => "Waning Gibbous",
            MoonPhaseName::WaningCrescent => "Waning Crescent",
            MoonPhaseName::Unknown => "Unknown",
        }
    }

    /// Name the phase from the Moon–Sun elongation at the start of a day
    /// (`start`) and 24 hours later (`next`), both in degrees `[0, 360)`.
    ///
    /// The rules are checked in order; the first match wins. A wrap of the
    /// elongation through 360° means a new moon happened during the day.
    pub fn from_angles(start: f64, next: f64) -> Self {
        if start <= 180.0 && 180.0 <= next {
            MoonPhaseName::FullMoon
        } else if next < start {
            MoonPhaseName::NewMoon
        } else if start <= 90.0 && next >= 90.0 {
            MoonPhaseName::FirstQuarter
        } else if start <= 270.0 && next >= 270.0 {
            MoonPhaseName::ThirdQuarter
        } else if next > 0.0 && next < 90.0 {
            MoonPhaseName::WaxingCrescent
        } else if (90.0..180.0).contains(&next) {
            MoonPhaseName::WaxingGibbous
        } else if next > 180.0 && next < 270.0 {
            MoonPhaseName::WaningGibbous
        } else if (270.0..360.0).contains(&next) {
            MoonPhaseName::WaningCrescent
        } else {
            MoonPhaseName::Unknown
        }
    }
}

impl fmt::Display for MoonPhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which body is eclipsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EclipseBody {
    Lunar,
    Solar,
}

impl EclipseBody {
    pub fn as_str(self) -> &'static str {
        match self {
            EclipseBody::Lunar => "Lunar",
            EclipseBody::Solar => "Solar",
        }
    }
}

impl fmt::Display for EclipseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An eclipse as seen from one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eclipse {
    /// Instants at which some phase of the eclipse can be watched, ascending.
    pub viewing_stages: Vec<DateTime<Utc>>,
    pub body: EclipseBody,
    /// "Total", "Partial", "Penumbral", "Annular", "Total Annular" or "".
    pub visibility: String,
}

impl Eclipse {
    pub fn first_stage(&self) -> Option<DateTime<Utc>> {
        self.viewing_stages.first().copied()
    }

    pub fn last_stage(&self) -> Option<DateTime<Utc>> {
        self.viewing_stages.last().copied()
    }
}

/// The part of an eclipse shown on a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleEclipse {
    /// Local time at which the eclipse first becomes visible that day.
    pub visible_at: NaiveDateTime,
    pub body: EclipseBody,
    pub visibility: String,
}

/// Sun and Moon events for one local calendar date. Times are local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    /// Local midnight starting the day.
    pub date: NaiveDateTime,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    pub moonrise: Option<NaiveDateTime>,
    pub moonset: Option<NaiveDateTime>,
    pub phase_name: MoonPhaseName,
    /// Illuminated percentage of the lunar disk, 0 to 100.
    pub phase: f64,
    pub eclipse: Option<VisibleEclipse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names_display() {
        assert_eq!(MoonPhaseName::FullMoon.to_string(), "Full Moon");
        assert_eq!(MoonPhaseName::ThirdQuarter.to_string(), "Third Quarter");
        assert_eq!(MoonPhaseName::Unknown.to_string(), "Unknown");
        assert_eq!(
            serde_json::to_string(&MoonPhaseName::WaxingGibbous).unwrap(),
            "\"Waxing Gibbous\""
        );
    }

    #[test]
    fn test_phase_name_rules() {
        assert_eq!(MoonPhaseName::from_angles(175.0, 187.0), MoonPhaseName::FullMoon);
        assert_eq!(MoonPhaseName::from_angles(355.0, 7.0), MoonPhaseName::NewMoon);
        assert_eq!(MoonPhaseName::from_angles(85.0, 97.0), MoonPhaseName::FirstQuarter);
        assert_eq!(MoonPhaseName::from_angles(265.0, 277.0), MoonPhaseName::ThirdQuarter);
        assert_eq!(MoonPhaseName::from_angles(20.0, 32.0), MoonPhaseName::WaxingCrescent);
        assert_eq!(MoonPhaseName::from_angles(100.0, 112.0), MoonPhaseName::WaxingGibbous);
        assert_eq!(MoonPhaseName::from_angles(200.0, 212.0), MoonPhaseName::WaningGibbous);
        assert_eq!(MoonPhaseName::from_angles(300.0, 312.0), MoonPhaseName::WaningCrescent);
        assert_eq!(MoonPhaseName::from_angles(0.0, 0.0), MoonPhaseName::Unknown);
    }

    #[test]
    fn test_full_moon_wins_over_quarter() {
        // Both 90 and 180 lie in the interval; full moon is checked first.
        assert_eq!(MoonPhaseName::from_angles(90.0, 180.0), MoonPhaseName::FullMoon);
    }

    #[test]
    fn test_eclipse_stage_accessors() {
        let t0 = DateTime::from_timestamp(1_427_000_000, 0).unwrap();
        let t1 = DateTime::from_timestamp(1_427_003_600, 0).unwrap();
        let eclipse = Eclipse {
            viewing_stages: vec![t0, t1],
            body: EclipseBody::Solar,
            visibility: "Partial".into(),
        };
        assert_eq!(eclipse.first_stage(), Some(t0));
        assert_eq!(eclipse.last_stage(), Some(t1));
        assert_eq!(eclipse.body.to_string(), "Solar");
    }
}
