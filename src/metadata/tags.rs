//! The closed set of metadata tags this crate understands, and a typed record over them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Metadata tags read by the coordinate and capture-date decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Tag {
    GpsLatitude,
    GpsLatitudeRef,
    GpsLongitude,
    GpsLongitudeRef,
    DateTimeOriginal,
    DateTimeDigitized,
    DateTime,
}

impl Tag {
    pub const ALL: [Self; 7] = [
        Self::GpsLatitude,
        Self::GpsLatitudeRef,
        Self::GpsLongitude,
        Self::GpsLongitudeRef,
        Self::DateTimeOriginal,
        Self::DateTimeDigitized,
        Self::DateTime,
    ];

    /// The standard EXIF name of the tag.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GpsLatitude => "GPSLatitude",
            Self::GpsLatitudeRef => "GPSLatitudeRef",
            Self::GpsLongitude => "GPSLongitude",
            Self::GpsLongitudeRef => "GPSLongitudeRef",
            Self::DateTimeOriginal => "DateTimeOriginal",
            Self::DateTimeDigitized => "DateTimeDigitized",
            Self::DateTime => "DateTime",
        }
    }

    /// Looks a tag up by name. Group-prefixed names such as `"GPS GPSLatitude"`,
    /// `"EXIF DateTimeOriginal"` or `"Image DateTime"` are accepted too.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let bare = name.rsplit_once(' ').map_or(name, |(_, tail)| tail);
        Self::ALL.into_iter().find(|tag| tag.name() == bare)
    }

    /// Whether the tag carries a sequence of rationals rather than text.
    pub const fn is_rational(self) -> bool {
        matches!(self, Self::GpsLatitude | Self::GpsLongitude)
    }

    pub(crate) const fn exif_tag(self) -> exif::Tag {
        match self {
            Self::GpsLatitude => exif::Tag::GPSLatitude,
            Self::GpsLatitudeRef => exif::Tag::GPSLatitudeRef,
            Self::GpsLongitude => exif::Tag::GPSLongitude,
            Self::GpsLongitudeRef => exif::Tag::GPSLongitudeRef,
            Self::DateTimeOriginal => exif::Tag::DateTimeOriginal,
            Self::DateTimeDigitized => exif::Tag::DateTimeDigitized,
            Self::DateTime => exif::Tag::DateTime,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A numerator/denominator pair as stored in EXIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rational {
    pub num: i64,
    pub denom: i64,
}

impl Rational {
    pub const fn new(num: i64, denom: i64) -> Self {
        Self { num, denom }
    }

    /// Evaluates the fraction. A zero denominator has no value.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> Option<f64> {
        (self.denom != 0).then(|| self.num as f64 / self.denom as f64)
    }

    /// Approximates a decimal value with a fixed denominator of one million.
    #[allow(clippy::cast_possible_truncation)]
    fn from_decimal(value: f64) -> Option<Self> {
        const DENOM: i64 = 1_000_000;
        let scaled = (value * 1_000_000.0).round();
        (scaled.is_finite() && scaled.abs() < 9.0e15).then(|| Self::new(scaled as i64, DENOM))
    }

    /// Parses `"num/den"`, a bare integer or a decimal number.
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.split_once('/') {
            Some((num, denom)) => Some(Self::new(
                num.trim().parse().ok()?,
                denom.trim().parse().ok()?,
            )),
            None => s
                .parse()
                .ok()
                .map(|num| Self::new(num, 1))
                .or_else(|| Self::from_decimal(s.parse().ok()?)),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(|num| Self::new(num, 1))
                .or_else(|| Self::from_decimal(n.as_f64()?)),
            Value::String(s) => Self::parse(s),
            Value::Array(pair) => match pair.as_slice() {
                [num, denom] => Some(Self::new(num.as_i64()?, denom.as_i64()?)),
                _ => None,
            },
            Value::Object(map) => Some(Self::new(
                map.get("num")?.as_i64()?,
                map.get("den").or_else(|| map.get("denom"))?.as_i64()?,
            )),
            _ => None,
        }
    }
}

impl From<exif::Rational> for Rational {
    fn from(r: exif::Rational) -> Self {
        Self::new(i64::from(r.num), i64::from(r.denom))
    }
}

impl From<exif::SRational> for Rational {
    fn from(r: exif::SRational) -> Self {
        Self::new(i64::from(r.num), i64::from(r.denom))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum TagValue {
    Rationals(Vec<Rational>),
    Text(String),
}

/// Parses the JSON form of a rational sequence. Returns `None` if any element is malformed,
/// so a partly readable sequence is never shortened into a different valid one.
fn rationals_from_json(value: &Value) -> Option<Vec<Rational>> {
    match value {
        Value::Array(items) => items.iter().map(Rational::from_json).collect(),
        // Stringified sequence like "[40, 26, 4600/100]"
        Value::String(s) => s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(Rational::parse)
            .collect(),
        _ => None,
    }
}

fn text_from_json(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim_matches(|c: char| c.is_whitespace() || c == '\0');
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        // Some tools emit single-element arrays for reference tags.
        Value::Array(items) if items.len() == 1 => text_from_json(&items[0]),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// A read-only view of the recognized tags of one photo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    fields: HashMap<Tag, TagValue>,
    /// Fields the source carried outside the recognized set.
    unrecognized: usize,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a field, builder style.
    #[must_use]
    pub fn with(mut self, tag: Tag, value: TagValue) -> Self {
        self.fields.insert(tag, value);
        self
    }

    #[must_use]
    pub fn with_rationals(self, tag: Tag, values: &[(i64, i64)]) -> Self {
        let rationals = values
            .iter()
            .map(|&(num, denom)| Rational::new(num, denom))
            .collect();
        self.with(tag, TagValue::Rationals(rationals))
    }

    #[must_use]
    pub fn with_text(self, tag: Tag, text: impl Into<String>) -> Self {
        self.with(tag, TagValue::Text(text.into()))
    }

    pub fn get(&self, tag: Tag) -> Option<&TagValue> {
        self.fields.get(&tag)
    }

    /// The tag's rational sequence, or `None` if missing or not rational.
    pub fn rationals(&self, tag: Tag) -> Option<&[Rational]> {
        match self.fields.get(&tag)? {
            TagValue::Rationals(values) => Some(values),
            TagValue::Text(_) => None,
        }
    }

    /// The tag's text with whitespace and NUL padding trimmed. Empty text is `None`.
    pub fn text(&self, tag: Tag) -> Option<&str> {
        match self.fields.get(&tag)? {
            TagValue::Text(s) => {
                let trimmed = s.trim_matches(|c: char| c.is_whitespace() || c == '\0');
                (!trimmed.is_empty()).then_some(trimmed)
            }
            TagValue::Rationals(_) => None,
        }
    }

    /// Whether none of the recognized tags are present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the photo carried any metadata at all, recognized or not.
    pub fn has_metadata(&self) -> bool {
        !self.fields.is_empty() || self.unrecognized > 0
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Builds a record from a JSON object keyed by tag name. Unknown keys are ignored.
    ///
    /// Coordinate tags whose value cannot be read as a rational sequence are kept as text,
    /// which the coordinate decoder treats as absent. `null`, empty strings and empty arrays
    /// count as missing tags.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let fields: HashMap<_, _> = map
            .iter()
            .filter_map(|(key, value)| {
                let tag = Tag::from_name(key)?;
                let rationals = tag
                    .is_rational()
                    .then(|| rationals_from_json(value))
                    .flatten()
                    .filter(|values| !values.is_empty());
                let parsed = match rationals {
                    Some(values) => TagValue::Rationals(values),
                    None => TagValue::Text(text_from_json(value)?),
                };
                Some((tag, parsed))
            })
            .collect();
        let unrecognized = map.keys().filter(|key| Tag::from_name(key).is_none()).count();
        Self {
            fields,
            unrecognized,
        }
    }

    /// Builds a record from the primary image fields of decoded EXIF data.
    pub fn from_exif(exif: &exif::Exif) -> Self {
        let fields: HashMap<_, _> = Tag::ALL
            .into_iter()
            .filter_map(|tag| {
                let field = exif.get_field(tag.exif_tag(), exif::In::PRIMARY)?;
                let value = match &field.value {
                    exif::Value::Rational(values) => {
                        TagValue::Rationals(values.iter().copied().map(Rational::from).collect())
                    }
                    exif::Value::SRational(values) => {
                        TagValue::Rationals(values.iter().copied().map(Rational::from).collect())
                    }
                    exif::Value::Ascii(lines) => TagValue::Text(
                        lines
                            .first()
                            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                            .unwrap_or_default(),
                    ),
                    _ => TagValue::Text(
                        field.display_value().to_string().trim_matches('"').to_string(),
                    ),
                };
                Some((tag, value))
            })
            .collect();
        let unrecognized = exif.fields().count().saturating_sub(fields.len());
        Self {
            fields,
            unrecognized,
        }
    }
}
