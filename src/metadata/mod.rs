//! Typed access to the handful of metadata tags the locator reads.
mod reader;
mod tags;

pub use reader::{read_metadata, read_metadata_from_path};
pub use tags::{MetadataRecord, Rational, Tag, TagValue};
