//! The dual-layer selector cache (C2, §4.2): a fast session-scoped tier
//! in front of a durable tier, with drift detection, stability-only
//! admission, and miss-triggered invalidation.

mod cache;
mod drift;
mod errors;
mod session;
mod stability;
mod store;

pub use cache::{CacheLookup, SelectorCache};
pub use drift::{dom_skeleton_hash, hash_distance_pct};
pub use errors::CacheError;
pub use session::{normalize_url, session_scope, SessionContext};
pub use stability::{is_stable_strategy, STABLE_STRATEGIES, VOLATILE_STRATEGIES};
pub use store::{
    DurableCacheStore, DurableKey, InMemoryDurableStore, InMemorySessionStore, SessionCacheStore,
    SessionKey, StoredSessionEntry,
};
