//! External cancellation signal.
//!
//! The executor never stops a step on its own. A host raises the signal
//! (for instance on a user-initiated cancel) and steps that observe it
//! report `(ABORTED, HALT)` through the normal result path.
//!
//! Only library hosts raise it, through
//! [`PipelineExecutor::with_abort_signal`](super::PipelineExecutor::with_abort_signal).
//! The `vanilla` binary does not wire it to Ctrl-C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the run.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
