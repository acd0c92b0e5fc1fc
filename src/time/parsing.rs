//! Parsing of EXIF capture timestamps into chrono types.

use chrono::{NaiveDateTime, Timelike};
use regex::Regex;
use std::sync::OnceLock;

static RE_CAPTURE_TIMESTAMP: OnceLock<Regex> = OnceLock::new();
static RE_OFFSET: OnceLock<Regex> = OnceLock::new();

/// Parses an EXIF timestamp (`YYYY:MM:DD HH:MM:SS`) with an optional timezone suffix.
///
/// `-` date separators, a `T` between date and time and fractional seconds are tolerated.
/// Returns the naive local datetime and the suffix offset in seconds, if one was present.
pub fn parse_capture_timestamp(s: &str) -> Option<(NaiveDateTime, Option<i32>)> {
    let re = RE_CAPTURE_TIMESTAMP.get_or_init(|| {
        Regex::new(
            r"^(\d{4})[:-](\d{2})[:-](\d{2})[ T](\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?\s*(Z|[+-]\d{2}:?\d{2})?$",
        )
        .expect("capture timestamp pattern is valid")
    });
    let caps = re.captures(s.trim())?;

    let normalized = format!(
        "{}:{}:{} {}:{}:{}",
        &caps[1], &caps[2], &caps[3], &caps[4], &caps[5], &caps[6]
    );
    let mut datetime = NaiveDateTime::parse_from_str(&normalized, "%Y:%m:%d %H:%M:%S").ok()?;

    if let Some(fraction) = caps.get(7) {
        let digits = fraction.as_str();
        let nanos: u32 = format!("{digits:0<9}").parse().ok()?;
        datetime = datetime.with_nanosecond(nanos)?;
    }

    let offset = match caps.get(8) {
        Some(suffix) => Some(parse_offset_string(suffix.as_str())?),
        None => None,
    };

    Some((datetime, offset))
}

/// Parses an offset like `"+02:00"`, `"-0500"` or `"Z"` into seconds east of UTC.
pub fn parse_offset_string(offset_str: &str) -> Option<i32> {
    if offset_str == "Z" {
        return Some(0);
    }
    let re = RE_OFFSET
        .get_or_init(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})$").expect("offset pattern is valid"));
    let caps = re.captures(offset_str)?;
    let sign = if &caps[1] == "-" { -1 } else { 1 };
    let hours = caps[2].parse::<i32>().ok()?;
    let minutes = caps[3].parse::<i32>().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parses_primary_format() {
        assert_eq!(
            parse_capture_timestamp("2023:03:04 10:15:00"),
            Some((ymd_hms(2023, 3, 4, 10, 15, 0), None))
        );
    }

    #[test]
    fn test_parses_timezone_suffixes() {
        let expected = ymd_hms(2023, 3, 4, 10, 15, 0);
        assert_eq!(
            parse_capture_timestamp("2023:03:04 10:15:00+02:00"),
            Some((expected, Some(7200)))
        );
        assert_eq!(
            parse_capture_timestamp("2023:03:04 10:15:00 -0530"),
            Some((expected, Some(-19800)))
        );
        assert_eq!(
            parse_capture_timestamp("2023:03:04 10:15:00Z"),
            Some((expected, Some(0)))
        );
    }

    #[test]
    fn test_tolerates_dashes_t_separator_and_fractions() {
        let (dt, offset) = parse_capture_timestamp("2021-12-31T23:59:58.25").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2021, 12, 31).unwrap());
        assert_eq!(dt.nanosecond(), 250_000_000);
        assert_eq!(offset, None);
    }

    #[test]
    fn test_rejects_invalid_timestamps() {
        assert_eq!(parse_capture_timestamp("0000:00:00 00:00:00"), None);
        assert_eq!(parse_capture_timestamp("2023:02:30 10:00:00"), None);
        assert_eq!(parse_capture_timestamp("yesterday"), None);
        assert_eq!(parse_capture_timestamp("2023:03:04 10:15:00+25:00"), None);
    }

    #[test]
    fn test_parse_offset_string() {
        assert_eq!(parse_offset_string("Z"), Some(0));
        assert_eq!(parse_offset_string("+01:00"), Some(3600));
        assert_eq!(parse_offset_string("-0800"), Some(-28800));
        assert_eq!(parse_offset_string("+1:00"), None);
    }
}
