//! Fixtures shared by unit tests.

use crate::geocode::ReverseResolver;
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use serde_json::Value as Json;
use std::future::Future;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn dms(tag: Tag, parts: [(u32, u32); 3]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(parts.iter().map(|&part| part.into()).collect()),
    }
}

/// A bare TIFF stream holding the GPS position of Pittsburgh and a capture date.
pub fn gps_tiff() -> Vec<u8> {
    let fields = [
        dms(Tag::GPSLatitude, [(40, 1), (26, 1), (46, 1)]),
        ascii(Tag::GPSLatitudeRef, "N"),
        dms(Tag::GPSLongitude, [(79, 1), (58, 1), (56, 1)]),
        ascii(Tag::GPSLongitudeRef, "W"),
        ascii(Tag::DateTimeOriginal, "2023:03:04 10:15:00"),
    ];
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer
        .write(&mut buf, false)
        .expect("writing a TIFF into memory should not fail");
    buf.into_inner()
}

/// Answers every lookup with the same payload and counts the calls.
pub struct StaticResolver {
    pub response: Option<Json>,
    pub calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new(response: Option<Json>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReverseResolver for StaticResolver {
    fn fetch(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> impl Future<Output = Option<Json>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(self.response.clone())
    }
}
