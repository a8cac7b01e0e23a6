use thiserror::Error;

/// Top-level orchestrator fault. Per SPEC_FULL §10 ("the orchestrator
/// crate's top-level error wraps each subsystem's error as a variant
/// rather than flattening to a string"), each subsystem's own error
/// type is preserved as a distinct variant.
///
/// None of these are returned from [`crate::Orchestrator::drive`]
/// itself — every subsystem fault the FSM can recover from is folded
/// into a [`soulbrowser_core_types::Failure`] and routed to the Healer
/// (§7). This type exists for callers that want to inspect *why* a
/// particular step transition happened, and for the one genuinely
/// unrecoverable case: a driver fault that isn't retryable.
#[derive(Debug, Error, Clone)]
pub enum OrchestratorError {
    #[error("discovery error: {0}")]
    Discovery(#[from] soulbrowser_discovery::DiscoveryError),

    #[error("gate error: {0}")]
    Gate(#[from] soulbrowser_gate::GateError),

    #[error("executor error: {0}")]
    Executor(#[from] soulbrowser_executor::ExecutorError),

    #[error("healer error: {0}")]
    Healer(#[from] soulbrowser_healer::HealerError),

    #[error("driver error: {0}")]
    Driver(#[from] soulbrowser_browser_driver::DriverError),

    /// §7 "Any unrecoverable driver fault (page closed, context
    /// destroyed) → terminate with verdict `fail` and surface the
    /// original error string in the run log."
    #[error("unrecoverable driver fault, run terminated: {0}")]
    Unrecoverable(String),
}
