//! Time facilities used across the application.
//!
//! Re-exports `chrono` and `chrono_tz` and adds the conversions between
//! naive local times and UTC that the calendar relies on.

pub use chrono;
pub use chrono_tz;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Midnight at the start of `date`.
pub fn local_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Instant at which the wall clock in `tz` shows `local`.
///
/// An ambiguous time (clocks going back) takes the earlier instant. A
/// time that does not exist (clocks going forward) is read one hour later.
pub fn local_to_utc(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| {
            // Only reachable for zones with gaps longer than an hour.
            let offset = tz.offset_from_utc_datetime(&local);
            Utc.from_utc_datetime(&(local - Duration::seconds(total_offset_seconds(&offset))))
        })
}

/// Wall-clock time in `tz` at the instant `utc`.
pub fn utc_to_local(tz: &Tz, utc: DateTime<Utc>) -> NaiveDateTime {
    utc.with_timezone(tz).naive_local()
}

/// Parse an IANA zone name such as "Europe/London".
pub fn parse_tz(name: &str) -> Option<Tz> {
    name.trim().parse().ok()
}

fn total_offset_seconds(offset: &<Tz as TimeZone>::Offset) -> i64 {
    use chrono::Offset;
    i64::from(offset.fix().local_minus_utc())
}
