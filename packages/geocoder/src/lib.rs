#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding pipeline for address maps.
//!
//! Converts free-text street addresses to latitude/longitude coordinates
//! using a hosted geocoding service configured via TOML files in
//! `services/` (see [`service_registry`]). Requests are issued strictly one
//! at a time:
//!
//! 1. [`locationiq`] performs a single HTTP lookup and classifies the
//!    response (success, unauthorized, rate limited, malformed).
//! 2. [`client::GeocodeClient`] wraps a [`Geocoder`] with the fixed
//!    request spacing and rate-limit back-off, and trips the shared
//!    [`cancel::CancellationToken`] on authentication failure.
//! 3. [`batch`] drives the client over an ordered list of addresses,
//!    polling the token before every call so an interrupted run still
//!    returns everything resolved so far.

pub mod batch;
pub mod cancel;
pub mod client;
pub mod locationiq;
pub mod progress;
pub mod service_registry;

use thiserror::Error;

/// A successfully geocoded address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    /// The address text that was submitted to the geocoder.
    pub address: String,
    /// Latitude (WGS84), always within `[-90, 90]`.
    pub latitude: f64,
    /// Longitude (WGS84), always within `[-180, 180]`.
    pub longitude: f64,
    /// The canonical address returned by the geocoder, if any.
    pub matched_address: Option<String>,
}

impl GeocodeResult {
    /// Returns `true` if the coordinates lie inside the WGS84 bounds.
    #[must_use]
    pub fn in_bounds(&self) -> bool {
        coordinates_in_bounds(self.latitude, self.longitude)
    }
}

/// Returns `true` if `lat`/`lon` are finite and inside the WGS84 bounds.
#[must_use]
pub fn coordinates_in_bounds(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (connection error, timeout, etc.).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service returned no candidates for the address.
    #[error("No match for '{address}'")]
    NoMatch {
        /// The address that could not be resolved.
        address: String,
    },

    /// The service responded with an unexpected HTTP status.
    #[error("Unexpected HTTP status {status}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The API key was rejected by the service.
    #[error("Authentication failed: the API key was rejected")]
    Unauthorized,

    /// No API key was configured.
    #[error("Missing API key")]
    MissingCredential,

    /// The run was interrupted before this address was attempted.
    #[error("Geocoding cancelled")]
    Cancelled,
}

impl GeocodeError {
    /// Returns `true` for errors that must stop the whole batch rather
    /// than just the current address.
    #[must_use]
    pub const fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::MissingCredential | Self::Cancelled
        )
    }
}

/// A single-address geocoding backend.
///
/// Implementations perform exactly one lookup per call and never retry;
/// pacing and back-off are applied by [`client::GeocodeClient`].
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves `address` to the first candidate returned by the service.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails, the service rejects
    /// it, or the response carries no usable candidate.
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError>;
}
