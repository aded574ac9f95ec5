//! Date and time text used in reports.

use chrono::{Datelike, Days, Months, NaiveDate, Timelike};

/// Two-digit rendering of small numbers: `7` becomes `"07"`.
pub fn zero_appender(n: u32) -> String {
    if n < 10 {
        format!("0{}", n)
    } else {
        n.to_string()
    }
}

/// `HH:MM:SS`
pub fn time_f<T: Timelike>(t: &T) -> String {
    format!(
        "{}:{}:{}",
        zero_appender(t.hour()),
        zero_appender(t.minute()),
        zero_appender(t.second())
    )
}

/// `DD-MM-YYYY`
pub fn date_f<D: Datelike>(d: &D) -> String {
    format!(
        "{}-{}-{}",
        zero_appender(d.day()),
        zero_appender(d.month()),
        d.year()
    )
}

pub fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

/// Same day `months` later, clamped to the end of a shorter month.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Same day `years` later; February 29 becomes February 28 off leap years.
pub fn add_years(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    years
        .checked_mul(12)
        .and_then(|months| add_months(date, months))
}
