use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use soulbrowser_core_types::HealRecord;

use crate::errors::HealHistoryError;

/// Uniqueness key: `(element_label, url_pattern, strategy)` (§3).
pub type HealKey = (String, String, String);

#[async_trait]
pub trait HealHistoryStore: Send + Sync {
    async fn get_all(
        &self,
        element_label: &str,
        url_pattern: &str,
    ) -> Result<Vec<HealRecord>, HealHistoryError>;

    /// Atomic upsert-with-increment (§6): bump `success_count` or
    /// `failure_count`, recompute the rolling `avg_heal_time_ms`.
    async fn record_outcome(
        &self,
        element_label: &str,
        url_pattern: &str,
        strategy: &str,
        success: bool,
        duration_ms: u64,
    ) -> Result<(), HealHistoryError>;
}

/// In-process store backed by `DashMap`, safe under concurrent access
/// across runs (§5). The default when no external durable relation is
/// wired up.
#[derive(Default)]
pub struct InMemoryHealHistoryStore {
    records: DashMap<HealKey, HealRecord>,
}

impl InMemoryHealHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HealHistoryStore for InMemoryHealHistoryStore {
    async fn get_all(
        &self,
        element_label: &str,
        url_pattern: &str,
    ) -> Result<Vec<HealRecord>, HealHistoryError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| {
                let (el, url, _) = entry.key();
                el == element_label && url == url_pattern
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn record_outcome(
        &self,
        element_label: &str,
        url_pattern: &str,
        strategy: &str,
        success: bool,
        duration_ms: u64,
    ) -> Result<(), HealHistoryError> {
        let key = (
            element_label.to_string(),
            url_pattern.to_string(),
            strategy.to_string(),
        );
        let mut record = self
            .records
            .entry(key)
            .or_insert_with(|| HealRecord {
                element_label: element_label.to_string(),
                url_pattern: url_pattern.to_string(),
                strategy: strategy.to_string(),
                success_count: 0,
                failure_count: 0,
                avg_heal_time_ms: 0.0,
                last_used_at: Utc::now(),
            });

        // Incremental-average formula from the original's SQL upsert
        // (SPEC_FULL §10, supplemented from original_source):
        // new_avg = (old_avg * old_total + sample) / (old_total + 1).
        let old_total = record.success_count + record.failure_count;
        record.avg_heal_time_ms = (record.avg_heal_time_ms * old_total as f64 + duration_ms as f64)
            / (old_total + 1) as f64;

        if success {
            record.success_count += 1;
        } else {
            record.failure_count += 1;
        }
        record.last_used_at = Utc::now();
        Ok(())
    }
}
