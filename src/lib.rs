//! # Photo Locator
//!
//! Find out where and when a photo was taken.
//!
//! This crate reads the EXIF metadata of a photo, decodes its GPS position and capture date,
//! and turns the position into a human-readable address through a reverse geocoding provider
//! (Nominatim by default).
//!
//! ## Key Features
//!
//! - **Metadata Reading**: Pulls the GPS and date tags out of JPEG, TIFF, HEIF and PNG files.
//! - **GPS Location**: Converts degrees/minutes/seconds rationals into validated decimal degrees.
//! - **Time Information**: Picks the most authoritative capture date and formats it for display.
//! - **Reverse Geocoding**: Resolves coordinates to country, town, street and more, with retries,
//!   rate-limit backoff and a two-tier cache so repeated positions never hit the network twice.
//!
//! ## Usage
//!
//! Create a `PhotoLocator` once, then call `locate_file` for every photo.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use photo_locator::PhotoLocator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let locator = PhotoLocator::builder()
//!         .contact("you@example.com")
//!         .build()?;
//!     let report = locator.locate_file(Path::new("assets/sunset.jpg")).await?;
//!
//!     println!("Taken on: {:?}", report.capture_date.map(|d| d.display));
//!     println!("Coordinate: {:?}", report.coordinate);
//!     println!("Address: {:?}", report.address.map(|a| a.display_name));
//!
//!     Ok(())
//! }
//! ```

mod error;
pub mod features;
pub mod geocode;
pub mod metadata;
mod photo_locator;
mod structs;
pub mod time;

#[cfg(test)]
mod test_support;

pub use error::PhotoLocatorError;
pub use features::gps::{Coordinate, get_coordinate};
pub use geocode::{AddressResult, CacheSettings, GeocodingCache, NominatimResolver, ReverseResolver};
pub use metadata::{MetadataRecord, read_metadata, read_metadata_from_path};
pub use photo_locator::PhotoLocator;
pub use structs::PhotoReport;
pub use time::{CaptureDate, get_capture_date};
