use std::sync::Arc;

use chrono::{Duration, Utc};
use soulbrowser_core_types::{CacheEntry, DiscoverySource, EngineConfig};
use soulbrowser_telemetry::Telemetry;
use tracing::{debug, info, warn};

use crate::drift::hash_distance_pct;
use crate::session::{normalize_url, session_scope, SessionContext};
use crate::stability::is_stable_strategy;
use crate::store::{
    DurableCacheStore, InMemoryDurableStore, InMemorySessionStore, SessionCacheStore,
    StoredSessionEntry,
};

/// Outcome of [`SelectorCache::lookup`].
#[derive(Clone, Debug, PartialEq)]
pub enum CacheLookup {
    Hit {
        selector: String,
        strategy: String,
        confidence: f64,
        source: DiscoverySource,
    },
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit { .. })
    }
}

/// The dual-tier selector cache (C2, §4.2): a fast session-scoped tier
/// in front of a durable tier, with drift detection, stability-only
/// admission, and miss-triggered invalidation. Cache faults never
/// surface past this type (§4.2 "Failure"): any store error is logged
/// and treated as a miss / dropped write.
pub struct SelectorCache {
    durable: Arc<dyn DurableCacheStore>,
    session: Arc<dyn SessionCacheStore>,
    config: EngineConfig,
    telemetry: Arc<Telemetry>,
}

impl SelectorCache {
    pub fn new(config: EngineConfig, telemetry: Arc<Telemetry>) -> Self {
        Self {
            durable: Arc::new(InMemoryDurableStore::new()),
            session: Arc::new(InMemorySessionStore::new()),
            config,
            telemetry,
        }
    }

    pub fn with_stores(
        durable: Arc<dyn DurableCacheStore>,
        session: Arc<dyn SessionCacheStore>,
        config: EngineConfig,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            durable,
            session,
            config,
            telemetry,
        }
    }

    /// §4.2 read path, steps 1-5.
    pub async fn lookup(
        &self,
        url: &str,
        element_label: &str,
        ctx: &SessionContext,
        dom_hash: Option<&str>,
    ) -> CacheLookup {
        if !self.config.enable_memory {
            return CacheLookup::Miss;
        }

        let url_pattern = normalize_url(url);
        let scope = session_scope(ctx, Utc::now());
        let session_key = (url_pattern.clone(), element_label.to_string(), scope);

        match self.session.get(&session_key).await {
            Ok(Some(entry)) => {
                if let (Some(new_hash), Some(old_hash)) = (dom_hash, entry.dom_hash.as_deref()) {
                    let threshold = self.config.drift_threshold_for(ctx.is_spa_heavy);
                    let distance = hash_distance_pct(new_hash, old_hash);
                    if distance > threshold {
                        info!(
                            element = element_label,
                            url_pattern = %url_pattern,
                            distance,
                            threshold,
                            "drift_detected"
                        );
                        self.telemetry.record_drift_detected();
                        self.invalidate_both(&session_key, &url_pattern, element_label)
                            .await;
                        self.telemetry.record_cache_invalidated();
                        self.telemetry.record_cache_miss();
                        return CacheLookup::Miss;
                    }
                }
                debug!(element = element_label, "cache_hit_fast");
                self.telemetry.record_cache_hit_fast();
                return CacheLookup::Hit {
                    selector: entry.selector,
                    strategy: entry.strategy,
                    confidence: entry.confidence,
                    source: DiscoverySource::SessionCache,
                };
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "session cache lookup faulted, proceeding as miss");
            }
        }

        let durable_key = (url_pattern.clone(), element_label.to_string());
        match self.durable.get(&durable_key).await {
            Ok(Some(mut entry)) => {
                let retention = Duration::days(self.config.durable_cache_retention_days as i64);
                let within_window = Utc::now() - entry.last_verified_at <= retention;
                if within_window {
                    entry.hit_count += 1;
                    entry.miss_count = 0;
                    entry.last_verified_at = Utc::now();
                    let warm = StoredSessionEntry {
                        selector: entry.selector.clone(),
                        strategy: entry.strategy.clone(),
                        confidence: entry.confidence,
                        stable: entry.stable,
                        dom_hash: entry.dom_hash.clone(),
                        expires_at: Utc::now(),
                    };
                    let ttl = Duration::seconds(self.config.fast_cache_ttl_seconds as i64);
                    if let Err(err) = self.session.set(session_key, warm, ttl).await {
                        warn!(error = %err, "failed to warm fast tier after durable hit");
                    }
                    if let Err(err) = self.durable.upsert(entry.clone()).await {
                        warn!(error = %err, "failed to persist durable hit_count update");
                    }
                    debug!(element = element_label, "cache_hit_durable");
                    self.telemetry.record_cache_hit_durable();
                    return CacheLookup::Hit {
                        selector: entry.selector,
                        strategy: entry.strategy,
                        confidence: entry.confidence,
                        source: DiscoverySource::DurableCache,
                    };
                }

                entry.miss_count += 1;
                self.telemetry.record_cache_miss();
                if entry.miss_count >= 2 {
                    if let Err(err) = self.durable.invalidate(&durable_key).await {
                        warn!(error = %err, "failed to invalidate stale durable entry");
                    }
                    self.telemetry.record_cache_invalidated();
                } else if let Err(err) = self.durable.upsert(entry).await {
                    warn!(error = %err, "failed to persist durable miss_count update");
                }
                CacheLookup::Miss
            }
            Ok(None) => {
                self.telemetry.record_cache_miss();
                CacheLookup::Miss
            }
            Err(err) => {
                warn!(error = %err, "durable cache lookup faulted, proceeding as miss");
                self.telemetry.record_cache_miss();
                CacheLookup::Miss
            }
        }
    }

    /// §4.2 write/admission path. Rejects (no-op) any write with
    /// `stable=false`, incrementing `volatile_selector_skipped` (I4).
    /// Admission independently re-derives stability from the strategy
    /// name (P8) rather than trusting the caller's flag alone.
    #[allow(clippy::too_many_arguments)]
    pub async fn save(
        &self,
        url: &str,
        element_label: &str,
        ctx: &SessionContext,
        selector: &str,
        strategy: &str,
        confidence: f64,
        stable: bool,
        dom_hash: Option<&str>,
    ) -> bool {
        if !self.config.enable_memory {
            return false;
        }

        let admitted_stable = stable && is_stable_strategy(strategy);
        if !admitted_stable {
            debug!(
                element = element_label,
                strategy, "volatile_selector_skipped"
            );
            self.telemetry.record_volatile_selector_skipped();
            return false;
        }

        let url_pattern = normalize_url(url);
        let entry = CacheEntry {
            url_pattern: url_pattern.clone(),
            element_label: element_label.to_string(),
            selector: selector.to_string(),
            strategy: strategy.to_string(),
            confidence,
            stable: true,
            dom_hash: dom_hash.map(str::to_string),
            hit_count: 0,
            miss_count: 0,
            last_verified_at: Utc::now(),
        };

        if let Err(err) = self.durable.upsert(entry).await {
            warn!(error = %err, "durable cache write faulted, write dropped");
            return false;
        }

        // Read-your-writes (§4.2 "Ordering guarantees"): warm the fast
        // tier immediately so a subsequent lookup in the same run hits.
        let scope = session_scope(ctx, Utc::now());
        let session_key = (url_pattern, element_label.to_string(), scope);
        let session_entry = StoredSessionEntry {
            selector: selector.to_string(),
            strategy: strategy.to_string(),
            confidence,
            stable: true,
            dom_hash: dom_hash.map(str::to_string),
            expires_at: Utc::now(),
        };
        let ttl = Duration::seconds(self.config.fast_cache_ttl_seconds as i64);
        if let Err(err) = self.session.set(session_key, session_entry, ttl).await {
            warn!(error = %err, "fast tier warm-up after admission faulted");
        }

        true
    }

    async fn invalidate_both(
        &self,
        session_key: &crate::store::SessionKey,
        url_pattern: &str,
        element_label: &str,
    ) {
        if let Err(err) = self.session.invalidate(session_key).await {
            warn!(error = %err, "session invalidation faulted");
        }
        let durable_key = (url_pattern.to_string(), element_label.to_string());
        if let Err(err) = self.durable.invalidate(&durable_key).await {
            warn!(error = %err, "durable invalidation faulted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> SelectorCache {
        SelectorCache::new(EngineConfig::default(), Arc::new(Telemetry::new()))
    }

    fn ctx() -> SessionContext {
        SessionContext::new("example.com", "/login").with_session_epoch(1)
    }

    #[tokio::test]
    async fn volatile_save_is_rejected() {
        let cache = cache();
        let admitted = cache
            .save(
                "https://example.com/login",
                "Submit",
                &ctx(),
                "role=button[name=\"Submit\"]",
                "role-name",
                0.94,
                false,
                None,
            )
            .await;
        assert!(!admitted);
        assert_eq!(cache.telemetry.snapshot().volatile_selector_skipped, 1);

        let lookup = cache
            .lookup("https://example.com/login", "Submit", &ctx(), None)
            .await;
        assert_eq!(lookup, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn stable_save_then_read_your_writes() {
        let cache = cache();
        let admitted = cache
            .save(
                "https://example.com/login",
                "Username",
                &ctx(),
                "[aria-label=\"Username\"]",
                "aria-label",
                0.97,
                true,
                Some("hash-a"),
            )
            .await;
        assert!(admitted);

        let lookup = cache
            .lookup("https://example.com/login", "Username", &ctx(), Some("hash-a"))
            .await;
        match lookup {
            CacheLookup::Hit { source, .. } => assert_eq!(source, DiscoverySource::SessionCache),
            CacheLookup::Miss => panic!("expected hit"),
        }
    }

    #[tokio::test]
    async fn two_consecutive_misses_evict_durable_entry() {
        let cache = cache();
        let stale_entry = CacheEntry {
            url_pattern: "https://example.com/login".into(),
            element_label: "Username".into(),
            selector: "[name=\"u\"]".into(),
            strategy: "name".into(),
            confidence: 0.93,
            stable: true,
            dom_hash: None,
            hit_count: 0,
            miss_count: 0,
            last_verified_at: Utc::now() - Duration::days(30),
        };
        cache.durable.upsert(stale_entry).await.unwrap();

        let first = cache
            .lookup("https://example.com/login", "Username", &ctx(), None)
            .await;
        assert_eq!(first, CacheLookup::Miss);
        let second = cache
            .lookup("https://example.com/login", "Username", &ctx(), None)
            .await;
        assert_eq!(second, CacheLookup::Miss);

        let key = ("https://example.com/login".to_string(), "Username".to_string());
        assert!(cache.durable.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn drift_above_threshold_invalidates_and_misses() {
        let cache = cache();
        cache
            .save(
                "https://example.com/login",
                "Username",
                &ctx(),
                "[aria-label=\"Username\"]",
                "aria-label",
                0.97,
                true,
                Some("hash-a-hash-a"),
            )
            .await;

        let lookup = cache
            .lookup(
                "https://example.com/login",
                "Username",
                &ctx(),
                Some("zzzz-zzzz-zz"),
            )
            .await;
        assert_eq!(lookup, CacheLookup::Miss);
        assert_eq!(cache.telemetry.snapshot().drift_detected, 1);

        let key = ("https://example.com/login".to_string(), "Username".to_string());
        assert!(cache.durable.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn disabled_memory_always_misses_and_never_saves() {
        let mut config = EngineConfig::default();
        config.enable_memory = false;
        let cache = SelectorCache::new(config, Arc::new(Telemetry::new()));
        let admitted = cache
            .save(
                "https://example.com/login",
                "Username",
                &ctx(),
                "[aria-label=\"Username\"]",
                "aria-label",
                0.97,
                true,
                None,
            )
            .await;
        assert!(!admitted);
        let lookup = cache
            .lookup("https://example.com/login", "Username", &ctx(), None)
            .await;
        assert_eq!(lookup, CacheLookup::Miss);
    }
}
