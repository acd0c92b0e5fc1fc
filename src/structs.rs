use crate::features::gps::Coordinate;
use crate::geocode::AddressResult;
use crate::time::CaptureDate;
use serde::Serialize;
use std::fmt;

const NOT_FOUND: &str = "Not found";

/// Everything the locator found out about one photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoReport {
    /// Whether the photo carried any metadata at all, recognized or not.
    pub has_metadata: bool,
    pub capture_date: Option<CaptureDate>,
    pub coordinate: Option<Coordinate>,
    pub address: Option<AddressResult>,
}

fn labelled(f: &mut fmt::Formatter<'_>, label: &str, value: &str) -> fmt::Result {
    if value.is_empty() {
        Ok(())
    } else {
        writeln!(f, "{label}: {value}")
    }
}

impl fmt::Display for PhotoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_metadata {
            writeln!(f, "No EXIF metadata found (or metadata stripped).")?;
        }

        let date = self.capture_date.as_ref().map_or(NOT_FOUND, |d| d.display.as_str());
        writeln!(f, "Date Taken: {date}")?;

        match &self.coordinate {
            Some(coordinate) => writeln!(f, "Coordinates: {coordinate}")?,
            None => writeln!(f, "Coordinates: {NOT_FOUND}")?,
        }

        match (&self.coordinate, &self.address) {
            (Some(_), Some(address)) => {
                if !address.country.is_empty() || !address.town.is_empty() {
                    write!(f, "Country: {} ({})", address.country, address.country_code)?;
                    if !address.town.is_empty() {
                        write!(f, " / Town: {}", address.town)?;
                    }
                    writeln!(f)?;
                }
                labelled(f, "Full Location", &address.display_name)?;
                labelled(f, "State/Province", &address.state)?;
                labelled(f, "County", &address.county)?;
                labelled(f, "Suburb/Neighborhood", &address.suburb)?;
                labelled(f, "Street", &address.road)?;
                labelled(f, "House Number", &address.house_number)?;
                labelled(f, "Postal Code", &address.postcode)?;
            }
            (Some(_), None) => writeln!(f, "Location: {NOT_FOUND}")?,
            (None, _) if self.has_metadata => writeln!(f, "Photo has EXIF but no GPS location.")?,
            (None, _) => {}
        }
        Ok(())
    }
}
