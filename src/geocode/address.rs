//! Mapping of the provider's locale-dependent address fields onto a stable schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reverse-geocoded address. Missing fields are empty strings, never absent.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResult {
    pub country: String,
    /// ISO 3166-1 alpha-2, upper case.
    pub country_code: String,
    /// The locality: town, city or village, whichever the provider filled first.
    pub town: String,
    pub county: String,
    /// State or province.
    pub state: String,
    /// Suburb or neighbourhood.
    pub suburb: String,
    pub postcode: String,
    pub road: String,
    pub house_number: String,
    pub display_name: String,
    /// The provider payload, untouched.
    pub raw: Value,
}

/// Returns the first key holding a non-empty string, or `""`.
fn first_present(fields: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .unwrap_or_default()
        .to_string()
}

/// Maps a raw provider response onto [`AddressResult`].
///
/// Returns `None` for payloads that carry no location: non-objects, empty objects, and
/// provider error replies such as `{"error": "Unable to geocode"}`.
pub fn normalize_address(raw: Value) -> Option<AddressResult> {
    let payload = raw.as_object()?;
    if payload.is_empty() || (payload.contains_key("error") && !payload.contains_key("address")) {
        return None;
    }

    let empty = Value::Null;
    let address = payload.get("address").unwrap_or(&empty);

    let country_code = first_present(address, &["country_code"]).to_uppercase();
    let mut country = first_present(address, &["country"]);
    if country.is_empty()
        && let Some(entry) = rust_iso3166::from_alpha2(&country_code)
    {
        country = entry.name.to_string();
    }

    Some(AddressResult {
        country,
        country_code,
        town: first_present(address, &["town", "city", "village"]),
        county: first_present(address, &["county"]),
        state: first_present(address, &["state", "province"]),
        suburb: first_present(address, &["suburb", "neighbourhood"]),
        postcode: first_present(address, &["postcode"]),
        road: first_present(address, &["road"]),
        house_number: first_present(address, &["house_number"]),
        display_name: first_present(&raw, &["display_name"]),
        raw,
    })
}
