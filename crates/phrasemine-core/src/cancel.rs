//! Cooperative cancellation for long mining runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable stop flag polled by the mining engines.
///
/// The greedy engine checks the token between candidates (never
/// mid-extension); the PrefixSpan engine checks it at every recursive entry.
/// A tripped token makes an engine return normally with the phrases emitted
/// so far — cancellation is a graceful stop, not an error.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Safe to call from a signal-handler thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once a stop has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
