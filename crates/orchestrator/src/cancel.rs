use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative run-level cancellation (§5 "Cancellation and timeouts":
/// "A run-level cancellation signal, if received, unwinds immediately
/// after the current driver call returns"). [`crate::Orchestrator::drive`]
/// checks this once per FSM iteration, i.e. at most one in-flight
/// driver call past the point the caller asked to cancel.
#[derive(Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_latches_once_cancelled() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());
        signal.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        clone.cancel();
        assert!(signal.is_cancelled());
    }
}
