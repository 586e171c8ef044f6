//! Sequential batch geocoding with cooperative interruption.
//!
//! Addresses are resolved strictly in input order, one request at a time.
//! Each address travels together with its metadata, so a failed lookup
//! drops both and successful results can never be paired with the wrong
//! record. The cancellation token is polled before every request; once it
//! trips the loop stops and whatever was already resolved is returned.

use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::client::GeocodeClient;
use crate::progress::ProgressCallback;
use crate::{GeocodeError, GeocodeResult, Geocoder};

/// An address to geocode plus the record it belongs to.
#[derive(Debug, Clone)]
pub struct BatchItem<M> {
    /// One-line address text sent to the geocoder.
    pub address: String,
    /// Caller-owned metadata carried through to the result.
    pub metadata: M,
}

/// A resolved address and the metadata it was submitted with.
#[derive(Debug, Clone)]
pub struct Located<M> {
    /// The geocoding result.
    pub result: GeocodeResult,
    /// Metadata from the matching [`BatchItem`].
    pub metadata: M,
}

/// Outcome of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome<M> {
    /// Successful results, in input order.
    pub located: Vec<Located<M>>,
    /// Number of addresses a request was attempted for.
    pub attempted: usize,
    /// Number of attempted addresses that did not resolve.
    pub failed: usize,
    /// Whether the run stopped early because the token tripped.
    pub interrupted: bool,
}

/// Geocodes `items` in order, keeping each item's metadata attached.
///
/// Never returns an error: per-address failures are skipped, and an
/// authentication failure or external cancellation ends the run early
/// with the partial results.
pub async fn batch_resolve_with<G: Geocoder, M>(
    client: &GeocodeClient<G>,
    items: Vec<BatchItem<M>>,
    cancel: &CancellationToken,
    progress: &Arc<dyn ProgressCallback>,
) -> BatchOutcome<M> {
    let total = items.len();
    log::info!("Geocoding {total} addresses...");
    progress.set_total(total as u64);

    let mut outcome = BatchOutcome {
        located: Vec::with_capacity(total),
        attempted: 0,
        failed: 0,
        interrupted: false,
    };

    for item in items {
        if cancel.is_cancelled() {
            outcome.interrupted = true;
            break;
        }

        match client.resolve(&item.address).await {
            Ok(result) => {
                outcome.attempted += 1;
                outcome.located.push(Located {
                    result,
                    metadata: item.metadata,
                });
            }
            Err(GeocodeError::Cancelled) => {
                outcome.interrupted = true;
                break;
            }
            Err(_) => {
                outcome.attempted += 1;
                outcome.failed += 1;
            }
        }

        progress.inc(1);
    }

    if !outcome.interrupted && cancel.is_cancelled() {
        outcome.interrupted = outcome.attempted < total;
    }

    let summary = format!(
        "Geocoded {}/{total} addresses ({} failed{})",
        outcome.located.len(),
        outcome.failed,
        if outcome.interrupted {
            ", interrupted"
        } else {
            ""
        }
    );
    log::info!("{summary}");
    progress.finish(summary);

    outcome
}

/// Geocodes plain addresses in order, returning only the successes.
///
/// The output preserves the relative order of the addresses that resolved;
/// it is shorter than `addresses` whenever anything failed or the run was
/// interrupted.
pub async fn batch_resolve<G: Geocoder>(
    client: &GeocodeClient<G>,
    addresses: &[String],
    cancel: &CancellationToken,
    progress: &Arc<dyn ProgressCallback>,
) -> Vec<GeocodeResult> {
    let items = addresses
        .iter()
        .map(|address| BatchItem {
            address: address.clone(),
            metadata: (),
        })
        .collect();

    batch_resolve_with(client, items, cancel, progress)
        .await
        .located
        .into_iter()
        .map(|l| l.result)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::client::Throttle;
    use crate::progress::{CountingProgress, null_progress};

    /// Answers from a per-call script; calls past the script succeed.
    #[derive(Default)]
    struct StubGeocoder {
        failures: BTreeMap<usize, fn() -> GeocodeError>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl StubGeocoder {
        fn failing_at(call: usize, error: fn() -> GeocodeError) -> Self {
            let mut stub = Self::default();
            stub.failures.insert(call, error);
            stub
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(address.to_string());
            if let Some(error) = self.failures.get(&call) {
                return Err(error());
            }
            #[allow(clippy::cast_precision_loss)]
            let offset = call as f64 / 1000.0;
            Ok(GeocodeResult {
                address: address.to_string(),
                latitude: 42.0 + offset,
                longitude: -87.0 - offset,
                matched_address: None,
            })
        }
    }

    fn addresses(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{i} Elm St, Winnetka, IL")).collect()
    }

    fn client(stub: StubGeocoder, token: &CancellationToken) -> GeocodeClient<StubGeocoder> {
        GeocodeClient::new(stub, Throttle::NONE, token.clone())
    }

    #[tokio::test]
    async fn all_successes_keep_length_and_order() {
        let token = CancellationToken::new();
        let client = client(StubGeocoder::default(), &token);
        let input = addresses(5);

        let results = batch_resolve(&client, &input, &token, &null_progress()).await;

        assert_eq!(results.len(), 5);
        for (i, (result, address)) in results.iter().zip(&input).enumerate() {
            assert_eq!(&result.address, address);
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f64 / 1000.0;
            assert!((result.latitude - (42.0 + offset)).abs() < 1e-12);
            assert!((result.longitude - (-87.0 - offset)).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn unauthorized_on_third_stops_the_batch() {
        let token = CancellationToken::new();
        let client = client(
            StubGeocoder::failing_at(2, || GeocodeError::Unauthorized),
            &token,
        );
        let input = addresses(10);

        let results = batch_resolve(&client, &input, &token, &null_progress()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].address, input[0]);
        assert_eq!(results[1].address, input[1]);
        assert_eq!(client.geocoder_calls(), 3);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn rate_limited_address_is_skipped_not_retried() {
        let token = CancellationToken::new();
        let client = client(
            StubGeocoder::failing_at(1, || GeocodeError::RateLimited),
            &token,
        );
        let input = addresses(4);

        let results = batch_resolve(&client, &input, &token, &null_progress()).await;

        let resolved: Vec<&str> = results.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(resolved, vec![&*input[0], &*input[2], &*input[3]]);
        assert_eq!(client.geocoder_calls(), 4);
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn metadata_stays_paired_after_failures() {
        let token = CancellationToken::new();
        let client = client(
            StubGeocoder::failing_at(0, || GeocodeError::Parse {
                message: "bad".to_string(),
            }),
            &token,
        );
        let items = addresses(3)
            .into_iter()
            .enumerate()
            .map(|(i, address)| BatchItem {
                address,
                metadata: format!("contact-{i}"),
            })
            .collect();

        let outcome = batch_resolve_with(&client, items, &token, &null_progress()).await;

        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.failed, 1);
        assert!(!outcome.interrupted);
        let pairs: Vec<(&str, &str)> = outcome
            .located
            .iter()
            .map(|l| (l.result.address.as_str(), l.metadata.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("2 Elm St, Winnetka, IL", "contact-1"),
                ("3 Elm St, Winnetka, IL", "contact-2"),
            ]
        );
    }

    #[tokio::test]
    async fn pre_cancelled_token_issues_no_calls() {
        let token = CancellationToken::new();
        token.request_cancel();
        let client = client(StubGeocoder::default(), &token);

        let outcome = batch_resolve_with(
            &client,
            addresses(3)
                .into_iter()
                .map(|address| BatchItem {
                    address,
                    metadata: (),
                })
                .collect(),
            &token,
            &null_progress(),
        )
        .await;

        assert!(outcome.located.is_empty());
        assert!(outcome.interrupted);
        assert_eq!(outcome.attempted, 0);
        assert_eq!(client.geocoder_calls(), 0);
    }

    #[tokio::test]
    async fn external_cancel_mid_batch_keeps_partial_results() {
        struct CancelAfter {
            inner: StubGeocoder,
            after: usize,
            token: CancellationToken,
        }

        #[async_trait::async_trait]
        impl Geocoder for CancelAfter {
            async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
                let result = self.inner.geocode(address).await;
                if self.inner.calls() == self.after {
                    self.token.request_cancel();
                }
                result
            }
        }

        let token = CancellationToken::new();
        let client = GeocodeClient::new(
            CancelAfter {
                inner: StubGeocoder::default(),
                after: 4,
                token: token.clone(),
            },
            Throttle::NONE,
            token.clone(),
        );

        let results = batch_resolve(&client, &addresses(10), &token, &null_progress()).await;

        assert_eq!(results.len(), 4);
        assert_eq!(client.geocoder().inner.calls(), 4);
    }

    #[tokio::test]
    async fn progress_counts_every_attempt() {
        let token = CancellationToken::new();
        let client = client(
            StubGeocoder::failing_at(1, || GeocodeError::NoMatch {
                address: String::new(),
            }),
            &token,
        );
        let counting = Arc::new(CountingProgress::default());
        let progress: Arc<dyn ProgressCallback> = counting.clone();

        let _ = batch_resolve(&client, &addresses(3), &token, &progress).await;

        assert_eq!(counting.total(), 3);
        assert_eq!(counting.position(), 3);
    }

    #[tokio::test]
    async fn empty_input_is_empty_output() {
        let token = CancellationToken::new();
        let client = client(StubGeocoder::default(), &token);
        let results = batch_resolve(&client, &[], &token, &null_progress()).await;
        assert!(results.is_empty());
        assert_eq!(client.geocoder_calls(), 0);
    }

    impl GeocodeClient<StubGeocoder> {
        fn geocoder_calls(&self) -> usize {
            self.geocoder().calls()
        }
    }
}
