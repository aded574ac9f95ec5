//! Julian day conversions, ΔT and angle normalisation helpers.

use crate::error::{EphemError, Result};
use crate::types::{CalendarKind, UtcComponents};

/// Julian day of the J2000.0 epoch (2000-01-01 12:00 TT).
pub const J2000: f64 = 2_451_545.0;
/// Days in a Julian century.
pub const DAYS_PER_CENTURY: f64 = 36_525.0;
/// Julian day of 1970-01-01 00:00 UTC.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Julian day for a calendar date, `hour` in decimal hours.
pub fn julian_day(year: i32, month: u32, day: u32, hour: f64, calendar: CalendarKind) -> f64 {
    let (mut y, mut m) = (year as f64, month as f64);
    if month <= 2 {
        y -= 1.0;
        m += 12.0;
    }

    let b = match calendar {
        CalendarKind::Gregorian => {
            let a = (y / 100.0).floor();
            2.0 - a + (a / 4.0).floor()
        }
        CalendarKind::Julian => 0.0,
    };

    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day as f64 + hour / 24.0
        + b
        - 1524.5
}

/// Broken-down date and time for a Julian day.
///
/// Works on whole milliseconds so that values such as `x.5` do not produce
/// 59.9999 seconds.
pub fn julian_day_to_utc(jd: f64, calendar: CalendarKind) -> Result<UtcComponents> {
    EphemError::check_jd(jd)?;

    let total_ms = ((jd + 0.5) * MS_PER_DAY).round() as i64;
    let z = total_ms.div_euclid(MS_PER_DAY as i64) as f64;
    let ms_of_day = total_ms.rem_euclid(MS_PER_DAY as i64);

    let a = match calendar {
        CalendarKind::Gregorian => {
            let alpha = ((z - 1_867_216.25) / 36_524.25).floor();
            z + 1.0 + alpha - (alpha / 4.0).floor()
        }
        CalendarKind::Julian => z,
    };
    let b = a + 1524.0;
    let c = ((b - 122.1) / 365.25).floor();
    let d = (365.25 * c).floor();
    let e = ((b - d) / 30.6001).floor();

    let day = (b - d - (30.6001 * e).floor()) as u32;
    let month = (if e < 14.0 { e - 1.0 } else { e - 13.0 }) as u32;
    let year = (if month > 2 { c - 4716.0 } else { c - 4715.0 }) as i32;

    let hour = (ms_of_day / 3_600_000) as u32;
    let minute = ((ms_of_day % 3_600_000) / 60_000) as u32;
    let second = (ms_of_day % 60_000) as f64 / 1000.0;

    Ok(UtcComponents {
        year,
        month,
        day,
        hour,
        minute,
        second,
    })
}

/// Julian day for seconds since the Unix epoch.
pub fn julian_day_from_unix(seconds: f64) -> f64 {
    UNIX_EPOCH_JD + seconds / 86_400.0
}

/// Seconds since the Unix epoch for a Julian day.
pub fn unix_from_julian_day(jd: f64) -> f64 {
    (jd - UNIX_EPOCH_JD) * 86_400.0
}

/// Decimal year of a Julian day, precise enough for ΔT.
fn decimal_year(jd: f64) -> f64 {
    2000.0 + (jd - J2000) / 365.25
}

/// ΔT = TT − UT in seconds.
pub fn delta_t(jd_ut: f64) -> f64 {
    let y = decimal_year(jd_ut);

    if (1860.0..1900.0).contains(&y) {
        let t = y - 1860.0;
        7.62 + 0.5737 * t - 0.251754 * t.powi(2) + 0.01680668 * t.powi(3)
            - 0.0004473624 * t.powi(4)
            + t.powi(5) / 233_174.0
    } else if (1900.0..1920.0).contains(&y) {
        let t = y - 1900.0;
        -2.79 + 1.494119 * t - 0.0598939 * t.powi(2) + 0.0061966 * t.powi(3)
            - 0.000197 * t.powi(4)
    } else if (1920.0..1941.0).contains(&y) {
        let t = y - 1920.0;
        21.20 + 0.84493 * t - 0.0761 * t.powi(2) + 0.0020936 * t.powi(3)
    } else if (1941.0..1961.0).contains(&y) {
        let t = y - 1950.0;
        29.07 + 0.407 * t - t.powi(2) / 233.0 + t.powi(3) / 2547.0
    } else if (1961.0..1986.0).contains(&y) {
        let t = y - 1975.0;
        45.45 + 1.067 * t - t.powi(2) / 260.0 - t.powi(3) / 718.0
    } else if (1986.0..2005.0).contains(&y) {
        let t = y - 2000.0;
        63.86 + 0.3345 * t - 0.060374 * t.powi(2)
            + 0.0017275 * t.powi(3)
            + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5)
    } else if (2005.0..2050.0).contains(&y) {
        let t = y - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t.powi(2)
    } else if (2050.0..2150.0).contains(&y) {
        let u = (y - 1820.0) / 100.0;
        -20.0 + 32.0 * u.powi(2) - 0.5628 * (2150.0 - y)
    } else {
        let u = (y - 1820.0) / 100.0;
        -20.0 + 32.0 * u.powi(2)
    }
}

/// Convert a UT Julian day to the TT scale.
pub fn ut_to_tt(jd_ut: f64) -> f64 {
    jd_ut + delta_t(jd_ut) / 86_400.0
}

/// Julian centuries since J2000 of a TT Julian day.
pub fn centuries(jd_tt: f64) -> f64 {
    (jd_tt - J2000) / DAYS_PER_CENTURY
}

/// Julian centuries since J2000 on the TT scale for a UT Julian day.
pub fn julian_centuries_tt(jd_ut: f64) -> f64 {
    centuries(ut_to_tt(jd_ut))
}

/// Normalise an angle to `[0, 360)`.
pub fn degnorm(x: f64) -> f64 {
    let y = x.rem_euclid(360.0);
    if y >= 360.0 {
        0.0
    } else {
        y
    }
}

/// `a - b` normalised to `[0, 360)`.
pub fn difdegn(a: f64, b: f64) -> f64 {
    degnorm(a - b)
}

/// `a - b` normalised to `[-180, 180)`.
pub fn difdeg2n(a: f64, b: f64) -> f64 {
    let d = degnorm(a - b);
    if d >= 180.0 {
        d - 360.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_julian_day_reference_dates() {
        assert_abs_diff_eq!(
            julian_day(2000, 1, 1, 12.0, CalendarKind::Gregorian),
            2_451_545.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            julian_day(1987, 6, 19, 12.0, CalendarKind::Gregorian),
            2_446_966.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            julian_day(1957, 10, 4, 19.44, CalendarKind::Gregorian),
            2_436_116.31,
            epsilon = 1e-6
        );
        // Julian calendar
        assert_abs_diff_eq!(
            julian_day(333, 1, 27, 12.0, CalendarKind::Julian),
            1_842_713.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_julian_day_to_utc_inverse() {
        let utc = julian_day_to_utc(2_436_116.31, CalendarKind::Gregorian).unwrap();
        assert_eq!((utc.year, utc.month, utc.day), (1957, 10, 4));
        assert_eq!((utc.hour, utc.minute), (19, 26));
        assert_abs_diff_eq!(utc.second, 24.0, epsilon = 1e-3);

        let jd = julian_day(2015, 9, 28, 2.0 + 47.0 / 60.0, CalendarKind::Gregorian);
        let utc = julian_day_to_utc(jd, CalendarKind::Gregorian).unwrap();
        assert_eq!((utc.year, utc.month, utc.day, utc.hour, utc.minute), (2015, 9, 28, 2, 47));
        assert_abs_diff_eq!(utc.second, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_julian_day_to_utc_rejects_nan() {
        assert!(julian_day_to_utc(f64::NAN, CalendarKind::Gregorian).is_err());
    }

    #[test]
    fn test_unix_epoch_conversions() {
        assert_abs_diff_eq!(julian_day_from_unix(0.0), UNIX_EPOCH_JD);
        assert_abs_diff_eq!(unix_from_julian_day(J2000), 946_728_000.0, epsilon = 1e-3);
    }

    #[test]
    fn test_delta_t_recent_values() {
        assert_abs_diff_eq!(delta_t(J2000), 63.86, epsilon = 0.05);
        let jd = julian_day(2015, 7, 1, 0.0, CalendarKind::Gregorian);
        let dt = delta_t(jd);
        assert!(dt > 66.0 && dt < 71.0, "delta_t(2015) = {}", dt);
    }

    #[test]
    fn test_angle_normalisation() {
        assert_abs_diff_eq!(degnorm(-30.0), 330.0);
        assert_abs_diff_eq!(degnorm(725.0), 5.0);
        assert_abs_diff_eq!(difdegn(10.0, 350.0), 20.0);
        assert_abs_diff_eq!(difdeg2n(10.0, 350.0), 20.0);
        assert_abs_diff_eq!(difdeg2n(350.0, 10.0), -20.0);
        assert_abs_diff_eq!(difdeg2n(180.0, 0.0), -180.0);
    }
}
