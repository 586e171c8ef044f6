//! Address list loading.
//!
//! Accepts the contact export layout (`First Name:`, `Last Name:`,
//! `Address:`, `Phone:`, `Email:`, `city`, `state`) as well as plain
//! snake_case headers. Rows that also carry `lat`/`lon` are already
//! located and skip geocoding.

use std::io::Read;
use std::path::Path;

use address_map_geometry::LatLon;
use address_map_map::{ContactCard, LabeledAddress, MarkerInfo, MarkerStyle};
use serde::Deserialize;

use crate::{InputError, missing_columns};

const ADDRESS: &[&str] = &["Address:", "address", "Address", "street"];
const CITY: &[&str] = &["city", "City", "City:"];
const STATE: &[&str] = &["state", "State", "State:"];
const FIRST_NAME: &[&str] = &["First Name:", "first_name", "First Name"];
const LAST_NAME: &[&str] = &["Last Name:", "last_name", "Last Name"];
const PHONE: &[&str] = &["Phone:", "phone", "Phone"];
const EMAIL: &[&str] = &["Email:", "email", "Email"];
const LABEL: &[&str] = &["label", "Label", "Label:"];

#[derive(Debug, Deserialize)]
struct AddressRow {
    #[serde(rename = "Address:", alias = "address", alias = "Address", alias = "street")]
    address: Option<String>,
    #[serde(alias = "City", alias = "City:")]
    city: Option<String>,
    #[serde(alias = "State", alias = "State:")]
    state: Option<String>,
    #[serde(rename = "First Name:", alias = "first_name", alias = "First Name")]
    first_name: Option<String>,
    #[serde(rename = "Last Name:", alias = "last_name", alias = "Last Name")]
    last_name: Option<String>,
    #[serde(rename = "Phone:", alias = "phone", alias = "Phone")]
    phone: Option<String>,
    #[serde(rename = "Email:", alias = "email", alias = "Email")]
    email: Option<String>,
    #[serde(alias = "Label", alias = "Label:")]
    label: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

impl AddressRow {
    fn position(&self, query: &str) -> Option<LatLon> {
        match (self.lat, self.lon) {
            (None, None) => None,
            (Some(lat), Some(lon)) if LatLon::new(lat, lon).is_valid() => {
                Some(LatLon::new(lat, lon))
            }
            (lat, lon) => {
                log::warn!(
                    "Ignoring coordinates ({lat:?}, {lon:?}) for '{query}'; it will be geocoded"
                );
                None
            }
        }
    }

    fn into_record(self, style: MarkerStyle) -> Option<AddressRecord> {
        let address = build_one_line_address(
            self.address.as_deref()?,
            self.city.as_deref(),
            self.state.as_deref(),
        );
        if address.is_empty() {
            return None;
        }
        let position = self.position(&address);

        let content = match style {
            MarkerStyle::ContactCard => MarkerInfo::Contact(ContactCard {
                first_name: self.first_name,
                last_name: self.last_name,
                address: self.address,
                phone: self.phone,
                email: self.email,
            }),
            MarkerStyle::Label => MarkerInfo::Label(LabeledAddress {
                label: self.label.unwrap_or_default(),
            }),
        };

        Some(AddressRecord {
            address,
            position,
            content,
        })
    }
}

/// One address to place on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRecord {
    /// One-line query text: street, city, state.
    pub address: String,
    /// Known position, when the row already carried coordinates.
    pub position: Option<LatLon>,
    /// Marker popup and tooltip source.
    pub content: MarkerInfo,
}

impl AddressRecord {
    /// `true` if this record needs no geocoding.
    #[must_use]
    pub const fn is_located(&self) -> bool {
        self.position.is_some()
    }
}

/// Case-insensitive city/state row filter. A `None` part matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionFilter {
    /// City to keep.
    pub city: Option<String>,
    /// State to keep.
    pub state: Option<String>,
}

impl RegionFilter {
    /// Builds a filter; blank parts are treated as absent.
    #[must_use]
    pub fn new(city: Option<&str>, state: Option<&str>) -> Self {
        let clean = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };
        Self {
            city: clean(city),
            state: clean(state),
        }
    }

    /// Whether a row with this city and state is kept.
    #[must_use]
    pub fn matches(&self, city: Option<&str>, state: Option<&str>) -> bool {
        fn part(want: Option<&str>, got: Option<&str>) -> bool {
            want.is_none_or(|want| got.is_some_and(|got| got.trim().eq_ignore_ascii_case(want)))
        }
        part(self.city.as_deref(), city) && part(self.state.as_deref(), state)
    }
}

/// Joins street, city and state into one geocoding query, skipping blank
/// parts.
#[must_use]
pub fn build_one_line_address(street: &str, city: Option<&str>, state: Option<&str>) -> String {
    [Some(street), city, state]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Loads the address list at `path`.
///
/// # Errors
///
/// * [`InputError::Io`] if the file cannot be opened.
/// * [`InputError::Csv`] if the header row cannot be read.
/// * [`InputError::MissingColumns`] if columns needed for `style` or
///   `filter` are absent.
pub fn load_addresses(
    path: &Path,
    style: MarkerStyle,
    filter: &RegionFilter,
) -> Result<Vec<AddressRecord>, InputError> {
    let file = std::fs::File::open(path).map_err(|e| InputError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_addresses(file, &path.display().to_string(), style, filter)
}

/// Reads an address list from any `Read` source. `source` names the input
/// in errors and logs.
///
/// Malformed and blank-address rows are skipped with a warning.
///
/// # Errors
///
/// See [`load_addresses`].
pub fn read_addresses(
    reader: impl Read,
    source: &str,
    style: MarkerStyle,
    filter: &RegionFilter,
) -> Result<Vec<AddressRecord>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| InputError::Csv {
            path: source.to_string(),
            source: e,
        })?
        .clone();

    let mut required = vec![ADDRESS];
    match style {
        MarkerStyle::ContactCard => required.extend([FIRST_NAME, LAST_NAME, PHONE, EMAIL]),
        MarkerStyle::Label => required.push(LABEL),
    }
    if filter.city.is_some() {
        required.push(CITY);
    }
    if filter.state.is_some() {
        required.push(STATE);
    }
    let missing = missing_columns(&headers, &required);
    if !missing.is_empty() {
        return Err(InputError::MissingColumns {
            path: source.to_string(),
            columns: missing,
        });
    }

    let mut records = Vec::new();
    let mut outside = 0usize;
    let mut skipped = 0usize;

    for result in reader.deserialize::<AddressRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("  skipping malformed row in {source}: {e}");
                skipped += 1;
                continue;
            }
        };

        if !filter.matches(row.city.as_deref(), row.state.as_deref()) {
            outside += 1;
            continue;
        }

        if let Some(record) = row.into_record(style) {
            records.push(record);
        } else {
            log::warn!("  skipping row with no address in {source}");
            skipped += 1;
        }
    }

    log::info!(
        "Loaded {} addresses from {source} ({outside} outside region, {skipped} skipped)",
        records.len()
    );

    Ok(records)
}
