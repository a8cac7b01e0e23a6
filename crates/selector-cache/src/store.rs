use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use soulbrowser_core_types::CacheEntry;

use crate::errors::CacheError;

/// Durable-tier key: `(url_pattern, element_label)` (§3 CacheEntry
/// uniqueness).
pub type DurableKey = (String, String);

/// Fast-tier key: `(url_pattern, element_label, session_scope)` (§3
/// SessionCacheEntry uniqueness).
pub type SessionKey = (String, String, String);

/// The durable tier: authoritative, retention-windowed, transactional
/// upsert semantics assumed by the store it persists to (§5 "the stores
/// they persist to are assumed to be transactional"). Implementations
/// may wrap any key/value store that supports `SELECT ... WHERE
/// (url_pattern, element_label)` plus upsert (§6).
#[async_trait]
pub trait DurableCacheStore: Send + Sync {
    async fn get(&self, key: &DurableKey) -> Result<Option<CacheEntry>, CacheError>;
    async fn upsert(&self, entry: CacheEntry) -> Result<(), CacheError>;
    async fn invalidate(&self, key: &DurableKey) -> Result<(), CacheError>;
}

/// The fast tier: a hint, never authoritative, with a per-key TTL the
/// store itself enforces.
#[async_trait]
pub trait SessionCacheStore: Send + Sync {
    async fn get(&self, key: &SessionKey) -> Result<Option<StoredSessionEntry>, CacheError>;
    async fn set(
        &self,
        key: SessionKey,
        entry: StoredSessionEntry,
        ttl: Duration,
    ) -> Result<(), CacheError>;
    async fn invalidate(&self, key: &SessionKey) -> Result<(), CacheError>;
}

/// A [`soulbrowser_core_types::SessionCacheEntry`] plus the absolute
/// expiry the session store enforces.
#[derive(Clone, Debug)]
pub struct StoredSessionEntry {
    pub selector: String,
    pub strategy: String,
    pub confidence: f64,
    pub stable: bool,
    pub dom_hash: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// In-process durable-tier store backed by `DashMap`, safe under
/// concurrent access across runs (§5 "Cross-run shared resources").
/// Good enough as the default when no external durable store is wired
/// up; a production deployment swaps this for a real transactional
/// store behind the same trait.
#[derive(Default)]
pub struct InMemoryDurableStore {
    entries: DashMap<DurableKey, CacheEntry>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableCacheStore for InMemoryDurableStore {
    async fn get(&self, key: &DurableKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.get(key).map(|e| e.clone()))
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let key = (entry.url_pattern.clone(), entry.element_label.clone());
        self.entries.insert(key, entry);
        Ok(())
    }

    async fn invalidate(&self, key: &DurableKey) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// In-process session-tier store. TTL is enforced lazily: an expired
/// entry is treated as absent on read and swept on the next write to
/// the same key.
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: DashMap<SessionKey, StoredSessionEntry>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionCacheStore for InMemorySessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<StoredSessionEntry>, CacheError> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.clone())),
            Some(_) => {
                self.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: SessionKey,
        mut entry: StoredSessionEntry,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        entry.expires_at = Utc::now() + ttl;
        self.entries.insert(key, entry);
        Ok(())
    }

    async fn invalidate(&self, key: &SessionKey) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}
