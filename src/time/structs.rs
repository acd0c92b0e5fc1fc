use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The capture date of a photo, ready for display.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureDate {
    /// `"04 March 2023"` when the timestamp parsed, otherwise the raw tag text unchanged.
    pub display: String,

    /// The camera's local wall-clock time, if the timestamp parsed.
    pub datetime_local: Option<NaiveDateTime>,

    /// Offset from UTC in seconds, when the timestamp carried a timezone suffix.
    pub offset_seconds: Option<i32>,

    /// Name of the tag the timestamp was read from.
    pub source: String,
}
