//! Report rendered as an HTML table for email.

use super::formatter::date_f;
use super::report::{eclipse_text, time_or_dashes};
use crate::models::CalendarDay;

pub const EMAIL_SUBJECT: &str = "AstroCalendar Generated Report";

const ROW: &str = "<tr style='border: 1px solid #000000'>";
const CELL: &str = "<td style='border: 1px solid #000000'>";

const HEADERS: [&str; 8] = [
    "Date",
    "Sunrise",
    "Sunset",
    "Moonrise",
    "Moonset",
    "Phase Name",
    "Illumination of Moon",
    "Eclipse",
];

/// HTML document with one bordered table row per day.
pub fn convert_to_html(days: &[CalendarDay]) -> String {
    let mut body = String::from(
        "<html><head><style>td { white-space: nowrap; min-width: 36px; padding: 5px 10px } \
         td, th, table { border: 1px solid #000000; } </style></head><body><table>",
    );

    body.push_str(ROW);
    for header in HEADERS {
        body.push_str("<th style='border: 1px solid #000000'>");
        body.push_str(header);
        body.push_str("</th>");
    }
    body.push_str("</tr>");

    for day in days {
        body.push_str(ROW);
        for cell in [
            date_f(&day.date),
            time_or_dashes(day.sunrise.as_ref()),
            time_or_dashes(day.sunset.as_ref()),
            time_or_dashes(day.moonrise.as_ref()),
            time_or_dashes(day.moonset.as_ref()),
            day.phase_name.to_string(),
        ] {
            body.push_str(CELL);
            body.push_str(&cell);
            body.push_str("</td>");
        }
        body.push_str(CELL);
        body.push_str(&format!(" %{:.2}", day.phase));
        body.push_str("</td>");

        body.push_str("<td>");
        match &day.eclipse {
            Some(e) => body.push_str(&eclipse_text(e)),
            None => body.push_str("&nbsp;"),
        }
        body.push_str("</td></tr>");
    }

    body.push_str("</table></body></html>");
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EclipseBody, MoonPhaseName, VisibleEclipse};
    use chrono::NaiveDate;

    fn day(d: u32, eclipse: bool) -> CalendarDay {
        let date = NaiveDate::from_ymd_opt(2015, 4, d).unwrap();
        CalendarDay {
            date: date.and_hms_opt(0, 0, 0).unwrap(),
            sunrise: Some(date.and_hms_opt(6, 35, 2).unwrap()),
            sunset: Some(date.and_hms_opt(19, 41, 30).unwrap()),
            moonrise: Some(date.and_hms_opt(20, 1, 0).unwrap()),
            moonset: None,
            phase_name: MoonPhaseName::FullMoon,
            phase: 99.5,
            eclipse: eclipse.then(|| VisibleEclipse {
                visible_at: date.and_hms_opt(3, 16, 9).unwrap(),
                body: EclipseBody::Lunar,
                visibility: "Total".into(),
            }),
        }
    }

    #[test]
    fn test_empty_table() {
        let html = convert_to_html(&[]);
        assert!(html.starts_with("<html><head><style>td { white-space: nowrap;"));
        assert!(html.contains("<th style='border: 1px solid #000000'>Illumination of Moon</th>"));
        assert!(html.ends_with("</tr></table></body></html>"));
        assert_eq!(html.matches("<th ").count(), 8);
    }

    #[test]
    fn test_rows() {
        let html = convert_to_html(&[day(4, true), day(5, false)]);
        assert!(html.contains(
            "<td style='border: 1px solid #000000'>04-04-2015</td>\
             <td style='border: 1px solid #000000'>06:35:02</td>"
        ));
        assert!(html.contains("<td style='border: 1px solid #000000'>--</td>"));
        assert!(html.contains("<td style='border: 1px solid #000000'> %99.50</td>"));
        assert!(html.contains(
            "<td>Total Lunar eclipse visible starting at: 03:16:09</td></tr>"
        ));
        assert!(html.contains("<td>&nbsp;</td></tr>"));
        assert_eq!(html.matches("</td></tr>").count(), 2);
        assert_eq!(html.matches("<tr style='border: 1px solid #000000'>").count(), 3);
    }
}
