//! Reads the recognized tags out of a photo file.

use crate::PhotoLocatorError;
use crate::metadata::MetadataRecord;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek};
use std::path::Path;

/// Reads EXIF data from a JPEG, TIFF, HEIF, PNG or WebP stream.
///
/// Photos without EXIF, or streams in a format the reader does not know, yield an empty
/// record. Only genuine I/O failures are errors.
pub fn read_metadata<R: BufRead + Seek>(reader: &mut R) -> Result<MetadataRecord, PhotoLocatorError> {
    match exif::Reader::new().read_from_container(reader) {
        Ok(exif) => Ok(MetadataRecord::from_exif(&exif)),
        Err(exif::Error::Io(err)) if err.kind() != io::ErrorKind::UnexpectedEof => Err(err.into()),
        Err(err) => {
            debug!("No readable EXIF block: {err}");
            Ok(MetadataRecord::default())
        }
    }
}

/// Opens `path` and reads its metadata record.
pub fn read_metadata_from_path(path: &Path) -> Result<MetadataRecord, PhotoLocatorError> {
    let file = File::open(path)?;
    read_metadata(&mut BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Tag;
    use std::io::{Cursor, Write};

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = read_metadata_from_path(Path::new("does/not/exist.jpg"));
        assert!(
            matches!(result, Err(PhotoLocatorError::Io(_))),
            "A missing file should surface as an I/O error"
        );
    }

    #[test]
    fn test_non_image_file_yields_empty_record() -> Result<(), PhotoLocatorError> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "this is not a photo, just some text that is long enough")?;

        let record = read_metadata_from_path(file.path())?;
        assert!(record.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_stream_yields_empty_record() -> Result<(), PhotoLocatorError> {
        let record = read_metadata(&mut Cursor::new(Vec::new()))?;
        assert!(record.is_empty());
        Ok(())
    }

    #[test]
    fn test_reads_gps_and_date_from_tiff() -> Result<(), PhotoLocatorError> {
        let tiff = crate::test_support::gps_tiff();

        let record = read_metadata(&mut Cursor::new(tiff))?;

        assert_eq!(record.text(Tag::GpsLatitudeRef), Some("N"));
        assert_eq!(record.text(Tag::GpsLongitudeRef), Some("W"));
        assert_eq!(record.rationals(Tag::GpsLatitude).map(<[_]>::len), Some(3));
        assert_eq!(record.text(Tag::DateTimeOriginal), Some("2023:03:04 10:15:00"));
        Ok(())
    }
}
