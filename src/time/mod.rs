//! Module for extracting the capture date of a photo from its metadata.
mod logic;
mod parsing;
pub mod structs;

pub use logic::{format_capture_date, get_capture_date};
pub use parsing::{parse_capture_timestamp, parse_offset_string};
pub use structs::CaptureDate;
