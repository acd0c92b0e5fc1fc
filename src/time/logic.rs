//! Picks the capture timestamp of a photo and formats it for display.

use super::parsing::parse_capture_timestamp;
use super::structs::CaptureDate;
use crate::metadata::{MetadataRecord, Tag};

/// Timestamp tags in order of preference.
const CAPTURE_SOURCES_PRIORITY: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

const DISPLAY_FORMAT: &str = "%d %B %Y";

/// Returns the capture date from the first present timestamp tag.
///
/// A timestamp that cannot be parsed is still returned, with its raw text as `display`.
pub fn get_capture_date(record: &MetadataRecord) -> Option<CaptureDate> {
    CAPTURE_SOURCES_PRIORITY.into_iter().find_map(|tag| {
        let raw = record.text(tag)?;
        let parsed = parse_capture_timestamp(raw);
        Some(CaptureDate {
            display: parsed.map_or_else(
                || raw.to_string(),
                |(dt, _)| dt.format(DISPLAY_FORMAT).to_string(),
            ),
            datetime_local: parsed.map(|(dt, _)| dt),
            offset_seconds: parsed.and_then(|(_, offset)| offset),
            source: tag.name().to_string(),
        })
    })
}

/// Formats a raw timestamp as `"04 March 2023"`, or returns it unchanged if it does not parse.
pub fn format_capture_date(raw: &str) -> String {
    parse_capture_timestamp(raw).map_or_else(
        || raw.to_string(),
        |(dt, _)| dt.format(DISPLAY_FORMAT).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_formats_primary_timestamp() {
        assert_eq!(format_capture_date("2023:03:04 10:15:00"), "04 March 2023");
        assert_eq!(format_capture_date("2019:11:30 08:00:00+09:00"), "30 November 2019");
    }

    #[test]
    fn test_unparsable_timestamp_is_returned_unchanged() {
        assert_eq!(format_capture_date("sometime in spring"), "sometime in spring");
        assert_eq!(format_capture_date("0000:00:00 00:00:00"), "0000:00:00 00:00:00");
    }

    #[test]
    fn test_null_source_falls_through_to_next() {
        let record = MetadataRecord::from_json(&json!({
            "DateTimeOriginal": null,
            "DateTimeDigitized": "",
            "DateTime": "2024:01:01 00:00:00"
        }));

        let date = get_capture_date(&record).expect("DateTime should be used");

        assert_eq!(date.display, "01 January 2024");
        assert_eq!(date.source, "DateTime");
    }

    #[test]
    fn test_prefers_original_over_digitized_and_file_time() {
        let record = MetadataRecord::from_json(&json!({
            "DateTime": "2024:01:01 00:00:00",
            "DateTimeDigitized": "2023:06:01 12:00:00",
            "DateTimeOriginal": "2023:03:04 10:15:00+01:00"
        }));

        let date = get_capture_date(&record).expect("Should find a capture date");

        assert_eq!(date.display, "04 March 2023");
        assert_eq!(date.source, "DateTimeOriginal");
        assert_eq!(date.offset_seconds, Some(3600));
        assert!(date.datetime_local.is_some());
    }

    #[test]
    fn test_falls_back_to_later_sources() {
        let digitized = MetadataRecord::from_json(&json!({
            "DateTimeOriginal": "",
            "EXIF DateTimeDigitized": "2023:06:01 12:00:00",
            "Image DateTime": "2024:01:01 00:00:00"
        }));
        let file_time = MetadataRecord::from_json(&json!({
            "Image DateTime": "2024:01:01 00:00:00"
        }));

        let date = get_capture_date(&digitized).unwrap();
        assert_eq!(date.display, "01 June 2023");
        assert_eq!(date.source, "DateTimeDigitized");

        let date = get_capture_date(&file_time).unwrap();
        assert_eq!(date.display, "01 January 2024");
        assert_eq!(date.source, "DateTime");
    }

    #[test]
    fn test_first_present_source_wins_even_if_unparsable() {
        let record = MetadataRecord::from_json(&json!({
            "DateTimeOriginal": "not a date",
            "DateTime": "2024:01:01 00:00:00"
        }));

        let date = get_capture_date(&record).unwrap();

        assert_eq!(date.display, "not a date");
        assert_eq!(date.datetime_local, None);
        assert_eq!(date.source, "DateTimeOriginal");
    }

    #[test]
    fn test_returns_none_without_timestamps() {
        assert!(get_capture_date(&MetadataRecord::new()).is_none());
    }
}
