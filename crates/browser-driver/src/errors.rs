use thiserror::Error;

/// Errors surfaced by a [`crate::BrowserDriver`] implementation. Every
/// variant other than [`DriverError::ContextDestroyed`] and
/// [`DriverError::PageClosed`] is recoverable: the Orchestrator maps it
/// to `Failure::Timeout` and routes to the Healer (§7).
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("element handle not found for selector '{0}'")]
    HandleNotFound(String),

    #[error("action '{action}' on '{selector}' timed out after {timeout_ms}ms")]
    ActionTimeout {
        action: String,
        selector: String,
        timeout_ms: u64,
    },

    #[error("evaluate() failed: {0}")]
    EvaluateFailed(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// The browser context was torn down mid-run. Unrecoverable per §7.
    #[error("browser context destroyed")]
    ContextDestroyed,

    /// The page was closed mid-run. Unrecoverable per §7.
    #[error("page closed")]
    PageClosed,

    #[error("driver error: {0}")]
    Other(String),
}

impl DriverError {
    /// Whether the Orchestrator should route this to the Healer (vs.
    /// terminating the run with `verdict=fail`; see §7 propagation
    /// policy, "Any unrecoverable driver fault").
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DriverError::ContextDestroyed | DriverError::PageClosed)
    }
}
