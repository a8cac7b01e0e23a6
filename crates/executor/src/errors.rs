use thiserror::Error;

/// Executor faults. Per §4.6/§7 ("Any driver exception yields
/// `failure = timeout`"), every variant here maps to `Failure::Timeout`
/// at the Orchestrator boundary — the taxonomy distinction lives in the
/// Gate, not here.
#[derive(Debug, Error, Clone)]
pub enum ExecutorError {
    #[error("driver error during execution: {0}")]
    Driver(#[from] soulbrowser_browser_driver::DriverError),

    #[error("resolved selector vanished before execution")]
    ElementVanished,

    #[error("no fill target found via the activator heuristic")]
    NoFillTarget,

    #[error("no fallback in the press chain succeeded")]
    PressChainExhausted,
}

impl ExecutorError {
    pub fn is_retryable(&self) -> bool {
        true
    }
}
