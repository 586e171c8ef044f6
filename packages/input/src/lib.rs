#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV input for address maps.
//!
//! Two files feed a run:
//!
//! * an address list ([`addresses`]): one row per address with either
//!   contact columns or a free-text label, filtered by city and state;
//! * an optional boundary file ([`polygons`]): one row per vertex,
//!   grouped into [`Polygon`](address_map_geometry::Polygon)s by id.

pub mod addresses;
pub mod polygons;

use address_map_geometry::GeometryError;
use thiserror::Error;

pub use addresses::{AddressRecord, RegionFilter, build_one_line_address, load_addresses};
pub use polygons::{load_polygons, load_polygons_if_present};

/// Errors from reading input files.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file could not be opened or read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV parsing error.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path to the CSV file.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The header row lacks columns the run needs.
    #[error("Missing required columns in {path}: {}", columns.join(", "))]
    MissingColumns {
        /// Path to the CSV file.
        path: String,
        /// Canonical names of the missing columns.
        columns: Vec<String>,
    },

    /// A row that cannot be skipped is invalid.
    #[error("Invalid row {line} in {path}: {message}")]
    InvalidRow {
        /// Path to the CSV file.
        path: String,
        /// 1-based line number, header included.
        line: u64,
        /// What was wrong.
        message: String,
    },

    /// A polygon could not be built from its vertices.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Returns the canonical name of every column group with no match in
/// `headers`. Each group lists the canonical name first, then aliases.
fn missing_columns(headers: &csv::StringRecord, required: &[&[&str]]) -> Vec<String> {
    required
        .iter()
        .filter(|names| !names.iter().any(|name| headers.iter().any(|h| h == *name)))
        .filter_map(|names| names.first().map(|name| (*name).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_reports_canonical_names() {
        let headers = csv::StringRecord::from(vec!["address", "city"]);
        let missing = missing_columns(
            &headers,
            &[&["Address:", "address"], &["city"], &["state", "State"]],
        );
        assert_eq!(missing, vec!["state".to_string()]);
    }

    #[test]
    fn missing_columns_error_lists_all() {
        let err = InputError::MissingColumns {
            path: "contacts.csv".to_string(),
            columns: vec!["Phone:".to_string(), "Email:".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns in contacts.csv: Phone:, Email:"
        );
    }
}
