//! Rate-limited single-address geocoding.
//!
//! [`GeocodeClient`] wraps any [`Geocoder`] with the service's fixed pacing:
//! it sleeps before every request, backs off after a rate-limited
//! response, and trips the shared [`CancellationToken`] when the service
//! rejects the API key so that no further requests are issued.

use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::service_registry::Pacing;
use crate::{GeocodeError, GeocodeResult, Geocoder};

/// Delays applied around each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// Fixed delay before every request.
    pub spacing: Duration,
    /// Additional delay after a rate-limited response.
    pub backoff: Duration,
}

impl Throttle {
    /// No delays at all.
    pub const NONE: Self = Self {
        spacing: Duration::ZERO,
        backoff: Duration::ZERO,
    };
}

impl From<Pacing> for Throttle {
    fn from(pacing: Pacing) -> Self {
        Self {
            spacing: pacing.spacing(),
            backoff: pacing.backoff(),
        }
    }
}

/// A [`Geocoder`] paced by a [`Throttle`] and bound to a cancellation token.
pub struct GeocodeClient<G> {
    geocoder: G,
    throttle: Throttle,
    cancel: CancellationToken,
}

impl<G: Geocoder> GeocodeClient<G> {
    /// Creates a client. `cancel` should be a clone of the token the
    /// batch loop polls.
    #[must_use]
    pub const fn new(geocoder: G, throttle: Throttle, cancel: CancellationToken) -> Self {
        Self {
            geocoder,
            throttle,
            cancel,
        }
    }

    /// The wrapped geocoder.
    #[must_use]
    pub const fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// The token this client trips on authentication failure.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Resolves a single address.
    ///
    /// Waits [`Throttle::spacing`] before sending. Errors are logged here;
    /// the caller only decides whether to keep going.
    ///
    /// # Errors
    ///
    /// * [`GeocodeError::Cancelled`] if the token was already tripped (no
    ///   request is sent).
    /// * [`GeocodeError::Unauthorized`] after tripping the token.
    /// * [`GeocodeError::RateLimited`] after sleeping [`Throttle::backoff`].
    /// * Any other [`GeocodeError`] from the underlying geocoder.
    pub async fn resolve(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        if self.cancel.is_cancelled() {
            return Err(GeocodeError::Cancelled);
        }

        sleep(self.throttle.spacing).await;

        match self.geocoder.geocode(address).await {
            Ok(result) => Ok(result),
            Err(GeocodeError::Unauthorized) => {
                log::error!("Invalid API key, stopping geocoding. Check your LocationIQ API key.");
                self.cancel.request_cancel();
                Err(GeocodeError::Unauthorized)
            }
            Err(GeocodeError::RateLimited) => {
                log::warn!(
                    "Rate limited while geocoding '{address}', waiting {:?}...",
                    self.throttle.backoff
                );
                sleep(self.throttle.backoff).await;
                Err(GeocodeError::RateLimited)
            }
            Err(e @ GeocodeError::NoMatch { .. }) => {
                log::debug!("{e}");
                Err(e)
            }
            Err(e) => {
                log::warn!("Error geocoding '{address}': {e}");
                Err(e)
            }
        }
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
