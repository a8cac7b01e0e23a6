use thiserror::Error;

/// Healer faults. Every variant is recoverable at the Orchestrator
/// boundary: a faulting heal round is just a failed round, consumed
/// against the budget like any other (§4.7).
#[derive(Debug, Error, Clone)]
pub enum HealerError {
    #[error("driver error during healing: {0}")]
    Driver(#[from] soulbrowser_browser_driver::DriverError),

    #[error("discovery error during reprobe: {0}")]
    Discovery(#[from] soulbrowser_discovery::DiscoveryError),

    #[error("gate error during re-gate: {0}")]
    Gate(#[from] soulbrowser_gate::GateError),
}

impl HealerError {
    pub fn is_retryable(&self) -> bool {
        true
    }
}
