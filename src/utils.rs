use chrono::{Datelike, Days, NaiveDate, Weekday};
use iso8601::{Date, DateTime, Time};
use xml::escape::escape_str_pcdata;

use std::borrow::Cow;

/// Escape a string for use as XML characters.
///
/// `&`, `<` and `>` are always replaced by entity references, and carriage returns by a character
/// reference. The resulting string is *not* suitable for use in XML attributes, but XML-RPC
/// doesn't use those.
pub fn escape_xml(s: &str) -> Cow<str> {
    let escaped = escape_str_pcdata(s);
    if escaped.contains(|c: char| c == '>' || c == '\r') {
        // a raw carriage return would be normalized to `\n` by the receiving parser
        Cow::Owned(escaped.replace('>', "&gt;").replace('\r', "&#13;"))
    } else {
        escaped
    }
}

/// Formats a double so that it always reads back as a double: finite values carry a decimal
/// point, and no exponent is ever used.
pub fn format_double(d: f64) -> String {
    // `Display` for floats never switches to exponent notation.
    let mut text = d.to_string();
    if d.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// Formats the wall-clock reading of `date_time` as `YYYYMMDDTHH:MM:SS`.
///
/// Milliseconds and the timezone offset are not representable and get dropped; week and ordinal
/// dates are converted to calendar dates first. Returns `None` for dates that don't exist, times
/// out of range and years that don't fit into four digits.
pub fn format_datetime(date_time: &DateTime) -> Option<String> {
    let Time { hour, minute, second, .. } = date_time.time;
    let date = calendar_date(&date_time.date)?;
    if !(0..=9999).contains(&date.year()) || !valid_time(hour, minute, second) {
        return None;
    }

    Some(format!(
        "{:04}{:02}{:02}T{:02}:{:02}:{:02}",
        date.year(),
        date.month(),
        date.day(),
        hour,
        minute,
        second
    ))
}

/// Parses the fixed `YYYYMMDDTHH:MM:SS` layout used by `<dateTime.iso8601>`.
///
/// Returns `None` if `text` deviates from the layout in any way (including dashes, fractional
/// seconds or a timezone suffix) or names an impossible date or time.
pub fn parse_datetime(text: &str) -> Option<DateTime> {
    let bytes = text.as_bytes();
    if bytes.len() != 17 {
        return None;
    }

    let layout_ok = bytes.iter().enumerate().all(|(i, &b)| match i {
        8 => b == b'T',
        11 | 14 => b == b':',
        _ => b.is_ascii_digit(),
    });
    if !layout_ok {
        return None;
    }

    let field = |range: std::ops::Range<usize>| text[range].parse::<u32>().ok();
    let (year, month, day) = (field(0..4)? as i32, field(4..6)?, field(6..8)?);
    let (hour, minute, second) = (field(9..11)?, field(12..14)?, field(15..17)?);

    NaiveDate::from_ymd_opt(year, month, day)?;
    if !valid_time(hour, minute, second) {
        return None;
    }

    Some(DateTime {
        date: Date::YMD { year, month, day },
        time: Time {
            hour,
            minute,
            second,
            millisecond: 0,
            tz_offset_hours: 0,
            tz_offset_minutes: 0,
        },
    })
}

fn valid_time(hour: u32, minute: u32, second: u32) -> bool {
    // a leap second may show up as `:60`
    hour <= 23 && minute <= 59 && second <= 60
}

fn calendar_date(date: &Date) -> Option<NaiveDate> {
    match *date {
        Date::YMD { year, month, day } => NaiveDate::from_ymd_opt(year, month, day),
        Date::Ordinal { year, ddd } => NaiveDate::from_yo_opt(year, ddd),
        Date::Week { year, ww, d } => {
            if !(1..=7).contains(&d) {
                return None;
            }
            NaiveDate::from_isoywd_opt(year, ww, Weekday::Mon)?.checked_add_days(Days::new(u64::from(d - 1)))
        }
    }
}
