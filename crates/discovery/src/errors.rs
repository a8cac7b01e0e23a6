use thiserror::Error;

/// Discovery faults. `NotFound` is not an error — a tier simply
/// returning no candidates is expressed as `Ok(None)` from the public
/// API (§4.4 "Post-conditions") — these variants are for genuine driver
/// or timeout faults during the search itself.
#[derive(Debug, Error, Clone)]
pub enum DiscoveryError {
    #[error("driver error during discovery: {0}")]
    Driver(#[from] soulbrowser_browser_driver::DriverError),

    #[error("discovery timed out after {0}ms")]
    Timeout(u64),

    #[error("invalid override anchor: {0}")]
    InvalidOverride(String),
}

impl DiscoveryError {
    /// Whether the Orchestrator should route to the Healer rather than
    /// terminate the run. All discovery faults are recoverable — a
    /// hard driver fault still surfaces through `ContextDestroyed`/
    /// `PageClosed` at the Executor boundary, not here.
    pub fn is_retryable(&self) -> bool {
        true
    }
}
