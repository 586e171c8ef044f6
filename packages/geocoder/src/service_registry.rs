//! Compile-time registry of geocoding service configurations.
//!
//! Each geocoding provider is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`], [`enabled_services`] and [`default_service`].

use std::time::Duration;

use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"locationiq"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be selected.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection order, lower values win.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
    /// Request pacing for this service.
    #[serde(default)]
    pub pacing: Pacing,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// `LocationIQ` forward geocoding (`key`, `q`, `format=json`).
    LocationIq {
        /// Search endpoint (e.g., `"https://us1.locationiq.com/v1/search.php"`).
        base_url: String,
    },
}

/// Client-side pacing applied around every request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pacing {
    /// Fixed delay before each request in milliseconds.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Extra delay after a rate-limited response in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit_ms(),
            rate_limit_backoff_ms: default_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Pacing {
    /// Delay before each request.
    #[must_use]
    pub const fn spacing(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Delay after a rate-limited response.
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const fn default_true() -> bool {
    true
}

const fn default_rate_limit_ms() -> u64 {
    1_000
}

const fn default_backoff_ms() -> u64 {
    5_000
}

const fn default_timeout_secs() -> u64 {
    10
}

impl GeocodingService {
    /// Returns the provider's base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::LocationIq { base_url } => base_url,
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[(
    "locationiq",
    include_str!("../services/locationiq.toml"),
)];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 1;

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    let mut services: Vec<GeocodingService> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

/// Returns the enabled service with the given id, or the highest-priority
/// enabled service when `id` is `None`.
#[must_use]
pub fn default_service(id: Option<&str>) -> Option<GeocodingService> {
    let services = enabled_services();
    match id {
        Some(id) => services.into_iter().find(|s| s.id == id),
        None => services.into_iter().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.id.is_empty(), "Service has empty id");
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                !svc.base_url().is_empty(),
                "Service {} has empty base_url",
                svc.id
            );
        }
    }

    #[test]
    fn locationiq_pacing_matches_service_policy() {
        let svc = default_service(Some("locationiq")).unwrap();
        assert_eq!(svc.pacing.spacing(), Duration::from_secs(1));
        assert_eq!(svc.pacing.backoff(), Duration::from_secs(5));
        assert_eq!(svc.pacing.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_pacing_uses_defaults() {
        let svc: GeocodingService = toml::de::from_str(
            r#"
            id = "test"
            name = "Test"
            priority = 1

            [provider]
            type = "location_iq"
            base_url = "http://localhost:1"
            "#,
        )
        .unwrap();
        assert!(svc.enabled);
        assert_eq!(svc.pacing.rate_limit_ms, 1_000);
        assert_eq!(svc.pacing.rate_limit_backoff_ms, 5_000);
    }

    #[test]
    fn unknown_service_id_is_none() {
        assert!(default_service(Some("does-not-exist")).is_none());
        assert!(default_service(None).is_some());
    }
}
