use thiserror::Error;

/// Cache faults are non-fatal by design (§4.2 "Failure", §7 propagation
/// policy): every variant here is something the [`crate::SelectorCache`]
/// catches internally, logs, and converts into a cache miss / dropped
/// write rather than surfacing to the caller. The type exists so a
/// pluggable store implementation has something concrete to return.
#[derive(Debug, Error, Clone)]
pub enum CacheError {
    #[error("durable store unavailable: {0}")]
    DurableUnavailable(String),

    #[error("session store unavailable: {0}")]
    SessionUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
