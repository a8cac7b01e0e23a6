use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::warn;

use crate::store::{HealHistoryStore, InMemoryHealHistoryStore};

const BEST_STRATEGY_CACHE_TTL_MINUTES: i64 = 5;

struct CachedLookup {
    strategies: Vec<String>,
    cached_at: DateTime<Utc>,
}

/// C3: records per-`(element,url,strategy)` success/failure for the
/// Healer's learned priors, and serves `get_best_strategy` ranked by
/// success rate then absolute success count, cached for 5 minutes by
/// `(element, url_pattern)` (§4.3).
pub struct HealHistory {
    store: Arc<dyn HealHistoryStore>,
    best_strategy_cache: DashMap<(String, String), CachedLookup>,
}

impl HealHistory {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryHealHistoryStore::new()),
            best_strategy_cache: DashMap::new(),
        }
    }

    pub fn with_store(store: Arc<dyn HealHistoryStore>) -> Self {
        Self {
            store,
            best_strategy_cache: DashMap::new(),
        }
    }

    /// Upsert an outcome. Non-fatal on fault: logs a warning and
    /// returns, per §4.3/§7 "Failures to record are non-fatal".
    pub async fn record_outcome(
        &self,
        element_label: &str,
        url_pattern: &str,
        strategy: &str,
        success: bool,
        duration_ms: u64,
    ) {
        if let Err(err) = self
            .store
            .record_outcome(element_label, url_pattern, strategy, success, duration_ms)
            .await
        {
            warn!(error = %err, element = element_label, "heal history record faulted, outcome dropped");
        }
        // A fresh outcome invalidates the cached ranking for this key.
        self.best_strategy_cache
            .remove(&(element_label.to_string(), url_pattern.to_string()));
    }

    /// Top-`top_n` strategies ranked by success rate (ties broken by
    /// absolute `success_count`), cached 5 minutes by `(element,
    /// url_pattern)`.
    pub async fn get_best_strategy(
        &self,
        element_label: &str,
        url_pattern: &str,
        top_n: usize,
    ) -> Vec<String> {
        let cache_key = (element_label.to_string(), url_pattern.to_string());
        if let Some(cached) = self.best_strategy_cache.get(&cache_key) {
            let age = Utc::now() - cached.cached_at;
            if age < Duration::minutes(BEST_STRATEGY_CACHE_TTL_MINUTES) {
                return cached.strategies.iter().take(top_n).cloned().collect();
            }
        }

        let mut records = match self.store.get_all(element_label, url_pattern).await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, element = element_label, "heal history lookup faulted, no priors");
                return Vec::new();
            }
        };

        records.sort_by(|a, b| {
            let rate_a = a.success_rate().unwrap_or(0.0);
            let rate_b = b.success_rate().unwrap_or(0.0);
            rate_b
                .partial_cmp(&rate_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.success_count.cmp(&a.success_count))
        });

        let ranked: Vec<String> = records.into_iter().map(|r| r.strategy).collect();
        self.best_strategy_cache.insert(
            cache_key,
            CachedLookup {
                strategies: ranked.clone(),
                cached_at: Utc::now(),
            },
        );
        ranked.into_iter().take(top_n).collect()
    }
}

impl Default for HealHistory {
    fn default() -> Self {
        Self::new()
    }
}
