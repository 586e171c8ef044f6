//! `LocationIQ` forward geocoding client.
//!
//! Issues one `GET {base_url}?key=..&q=..&format=json` per address and
//! uses the first returned candidate. The public endpoint enforces strict
//! rate limits; pacing is applied by [`crate::client::GeocodeClient`].
//!
//! See <https://docs.locationiq.com/reference/search>

use crate::service_registry::GeocodingService;
use crate::{GeocodeError, GeocodeResult, Geocoder, coordinates_in_bounds};

/// User agent sent with every request.
const USER_AGENT: &str = concat!("address-map/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one `LocationIQ` endpoint and API key.
#[derive(Debug, Clone)]
pub struct LocationIqClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LocationIqClient {
    /// Builds a client for `service` with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingCredential`] if `api_key` is empty
    /// (no request is ever attempted), or [`GeocodeError::Http`] if the
    /// HTTP client cannot be constructed.
    pub fn new(service: &GeocodingService, api_key: &str) -> Result<Self, GeocodeError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GeocodeError::MissingCredential);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(service.pacing.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: service.base_url().to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Geocoder for LocationIqClient {
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", address),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GeocodeError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        // LocationIQ answers 404 with `{"error":"Unable to geocode"}`.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GeocodeError::NoMatch {
                address: address.to_string(),
            });
        }
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await?;
        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| GeocodeError::Parse {
                message: format!("Response is not JSON: {e}"),
            })?;
        parse_response(address, &body)
    }
}

/// Parses a search response, taking the first candidate.
fn parse_response(address: &str, body: &serde_json::Value) -> Result<GeocodeResult, GeocodeError> {
    let candidates = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "LocationIQ response is not an array".to_string(),
    })?;

    let Some(first) = candidates.first() else {
        return Err(GeocodeError::NoMatch {
            address: address.to_string(),
        });
    };

    let lat = coordinate(first, "lat")?;
    let lon = coordinate(first, "lon")?;

    if !coordinates_in_bounds(lat, lon) {
        return Err(GeocodeError::Parse {
            message: format!("Coordinates out of range: {lat}, {lon}"),
        });
    }

    Ok(GeocodeResult {
        address: address.to_string(),
        latitude: lat,
        longitude: lon,
        matched_address: first["display_name"].as_str().map(String::from),
    })
}

/// Reads a coordinate that may be encoded as a JSON string or number.
fn coordinate(candidate: &serde_json::Value, field: &str) -> Result<f64, GeocodeError> {
    let value = &candidate[field];
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .ok_or_else(|| GeocodeError::Parse {
            message: format!("Missing {field} in LocationIQ response"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_registry::default_service;

    #[test]
    fn parses_first_candidate() {
        let body = serde_json::json!([
            {
                "lat": "42.1080",
                "lon": "-87.7352",
                "display_name": "Winnetka, New Trier Township, Cook County, Illinois, USA"
            },
            { "lat": "10.0", "lon": "10.0" }
        ]);
        let result = parse_response("Winnetka, IL", &body).unwrap();
        assert_eq!(result.address, "Winnetka, IL");
        assert!((result.latitude - 42.108).abs() < 1e-9);
        assert!((result.longitude - -87.7352).abs() < 1e-9);
        assert!(result.matched_address.unwrap().starts_with("Winnetka"));
    }

    #[test]
    fn accepts_numeric_coordinates() {
        let body = serde_json::json!([{ "lat": 41.8827, "lon": -87.6278 }]);
        let result = parse_response("x", &body).unwrap();
        assert!((result.latitude - 41.8827).abs() < 1e-9);
        assert!(result.matched_address.is_none());
    }

    #[test]
    fn empty_array_is_no_match() {
        let body = serde_json::json!([]);
        assert!(matches!(
            parse_response("nowhere", &body),
            Err(GeocodeError::NoMatch { address }) if address == "nowhere"
        ));
    }

    #[test]
    fn object_body_is_parse_error() {
        let body = serde_json::json!({ "error": "Invalid key" });
        assert!(matches!(
            parse_response("x", &body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn unparseable_lat_is_parse_error() {
        let body = serde_json::json!([{ "lat": "north", "lon": "-87.0" }]);
        assert!(matches!(
            parse_response("x", &body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let body = serde_json::json!([{ "lat": "123.0", "lon": "-87.0" }]);
        assert!(matches!(
            parse_response("x", &body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn empty_key_fails_fast() {
        let service = default_service(None).unwrap();
        assert!(matches!(
            LocationIqClient::new(&service, "   "),
            Err(GeocodeError::MissingCredential)
        ));
        assert!(LocationIqClient::new(&service, "pk.test").is_ok());
    }
}
