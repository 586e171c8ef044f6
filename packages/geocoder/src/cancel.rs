//! Cooperative cancellation for geocoding runs.
//!
//! A [`CancellationToken`] moves one way, from running to cancelled. Any
//! clone may request cancellation (a Ctrl-C handler, or the client after
//! an authentication failure); the batch loop only ever polls it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared, clonable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the running state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the run as cancelled. Calling this more than once is a no-op.
    pub fn request_cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            log::debug!("Cancellation requested");
        }
    }

    /// Returns `true` once cancellation has been requested on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::new();
        let handle = token.clone();
        handle.request_cancel();
        assert!(token.is_cancelled());
        token.request_cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn cancel_from_another_thread() {
        let token = CancellationToken::new();
        let handle = token.clone();
        std::thread::spawn(move || handle.request_cancel())
            .join()
            .unwrap();
        assert!(token.is_cancelled());
    }
}
