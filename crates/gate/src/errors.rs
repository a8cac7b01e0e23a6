use thiserror::Error;

/// Gate faults. A failed check is not an error — it is expressed in the
/// returned [`crate::GateOutcome`] — these variants are for genuine
/// driver faults encountered while running the checks.
#[derive(Debug, Error, Clone)]
pub enum GateError {
    #[error("driver error during gate check: {0}")]
    Driver(#[from] soulbrowser_browser_driver::DriverError),

    #[error("gate timed out after {0}ms")]
    Timeout(u64),
}

impl GateError {
    /// Every gate fault maps to `Failure::Timeout` at the call site
    /// (§4.5 "timeout or absent handle → timeout"); always recoverable,
    /// the Orchestrator routes to the Healer rather than terminating.
    pub fn is_retryable(&self) -> bool {
        true
    }
}
