//! Progress reporting for batch geocoding.
//!
//! The batch loop reports through [`ProgressCallback`] so it does not care
//! whether progress ends up on an `indicatif` bar, in the log, or nowhere.
//! Progress is advisory only; nothing in the pipeline reads it back.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress updates from long-running geocoding work.
///
/// Implementations must be `Send + Sync` so one instance can be shared
/// through an `Arc` with a signal handler task.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Keeps running totals in atomics instead of drawing anything.
///
/// Useful for headless runs and for asserting on progress in tests.
#[derive(Debug, Default)]
pub struct CountingProgress {
    total: AtomicU64,
    position: AtomicU64,
}

impl CountingProgress {
    /// The most recent total passed to [`ProgressCallback::set_total`].
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Units of work completed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::SeqCst)
    }
}

impl ProgressCallback for CountingProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
        self.position.store(0, Ordering::SeqCst);
    }

    fn inc(&self, delta: u64) {
        self.position.fetch_add(delta, Ordering::SeqCst);
    }

    fn set_message(&self, _msg: String) {}

    fn finish(&self, msg: String) {
        log::info!("{msg}");
    }
}
