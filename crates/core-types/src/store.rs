use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable-tier cache record. Uniqueness key: `(url_pattern,
/// element_label)`. Invariant I1/I4: `stable` is always `true` for a
/// record that made it into the store — admission rejects the write
/// otherwise, it never stores the flag as `false`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url_pattern: String,
    pub element_label: String,
    pub selector: String,
    pub strategy: String,
    pub confidence: f64,
    pub stable: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dom_hash: Option<String>,
    pub hit_count: u32,
    pub miss_count: u32,
    pub last_verified_at: DateTime<Utc>,
}

/// Fast session-scoped cache record, keyed by `(url_pattern,
/// element_label, session_scope)` with a TTL enforced by the store, not
/// by this type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionCacheEntry {
    pub url_pattern: String,
    pub element_label: String,
    pub session_scope: String,
    pub selector: String,
    pub strategy: String,
    pub confidence: f64,
    pub stable: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dom_hash: Option<String>,
    pub last_verified_at: DateTime<Utc>,
}

/// Heal-history record. Uniqueness key: `(element_label, url_pattern,
/// strategy)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealRecord {
    pub element_label: String,
    pub url_pattern: String,
    pub strategy: String,
    pub success_count: u64,
    pub failure_count: u64,
    pub avg_heal_time_ms: f64,
    pub last_used_at: DateTime<Utc>,
}

impl HealRecord {
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.success_count + self.failure_count;
        if total == 0 {
            None
        } else {
            Some(self.success_count as f64 / total as f64 * 100.0)
        }
    }
}
