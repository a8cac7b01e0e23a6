/// Shared severity taxonomy for subsystem error enums, mirroring the
/// `is_retryable()`/`severity()` pattern used throughout the action-*
/// crates this engine grew out of. A subsystem error carries its own
/// variant set but reports its severity through this common scale so
/// the Orchestrator can decide heal-vs-terminate without matching on
/// every crate's error type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// Transient; the Orchestrator should route to the Healer.
    Recoverable,
    /// Non-fatal; log and proceed as if the faulting subsystem were
    /// absent (cache/heal-history faults, screenshot faults).
    Warning,
    /// Unrecoverable; the run terminates with `verdict=fail`.
    Fatal,
}
