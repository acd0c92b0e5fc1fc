use crate::metadata::{MetadataRecord, Rational, Tag};
use serde::Serialize;
use std::fmt;

/// A validated position in decimal degrees.
///
/// Latitude is always within `[-90, 90]` and longitude within `[-180, 180]`; the only way to
/// obtain a `Coordinate` is through [`Coordinate::new`], which refuses anything else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        ((-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude))
            .then_some(Self {
                latitude,
                longitude,
            })
    }

    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Converts a degrees/minutes[/seconds] rational sequence into decimal degrees.
///
/// Only two- and three-element sequences are accepted. A zero denominator anywhere makes the
/// whole value absent.
pub fn dms_to_degrees(parts: &[Rational]) -> Option<f64> {
    let (degrees, minutes, seconds) = match parts {
        [d, m] => (d.to_f64()?, m.to_f64()?, 0.0),
        [d, m, s] => (d.to_f64()?, m.to_f64()?, s.to_f64()?),
        _ => return None,
    };
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}

/// Applies the sign of a hemisphere reference. Only the first character counts.
fn apply_hemisphere(value: f64, reference: &str, negative: char) -> Option<f64> {
    let first = reference.chars().next()?;
    Some(if first.eq_ignore_ascii_case(&negative) {
        -value
    } else {
        value
    })
}

/// Decodes the GPS position of a photo.
///
/// Returns `None` when any of the four GPS tags is missing, when a value is malformed, or when
/// the decoded position falls outside the valid range. Photos without GPS are common, so none
/// of this is an error.
pub fn get_coordinate(record: &MetadataRecord) -> Option<Coordinate> {
    let (Some(lat_parts), Some(lat_ref), Some(lon_parts), Some(lon_ref)) = (
        record.rationals(Tag::GpsLatitude),
        record.text(Tag::GpsLatitudeRef),
        record.rationals(Tag::GpsLongitude),
        record.text(Tag::GpsLongitudeRef),
    ) else {
        return None;
    };

    let latitude = apply_hemisphere(dms_to_degrees(lat_parts)?, lat_ref, 'S')?;
    let longitude = apply_hemisphere(dms_to_degrees(lon_parts)?, lon_ref, 'W')?;

    Coordinate::new(latitude, longitude)
}
