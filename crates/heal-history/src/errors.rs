use thiserror::Error;

/// Heal-history faults are non-fatal (§4.3 "Failures to record are
/// non-fatal"): the Healer logs and proceeds as if no prior existed.
#[derive(Debug, Error, Clone)]
pub enum HealHistoryError {
    #[error("heal history store unavailable: {0}")]
    StoreUnavailable(String),
}
