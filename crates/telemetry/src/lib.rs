//! Thirteen named run counters: plain atomics behind `record_*()`
//! methods and a `snapshot()`/`reset()` pair. No HTTP scrape endpoint
//! here — this stays an in-process snapshot type a consumer can expose
//! however it likes rather than a full Prometheus registry.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// One run's or one process's worth of telemetry counters. Cheap to
/// construct; intended to live behind an `Arc` shared by every
/// subsystem in a run (and, for cross-run counters, by the engine).
#[derive(Default)]
pub struct Telemetry {
    cache_hit_fast: AtomicU64,
    cache_hit_durable: AtomicU64,
    cache_miss: AtomicU64,
    volatile_selector_skipped: AtomicU64,
    drift_detected: AtomicU64,
    cache_invalidated: AtomicU64,
    heal_success: AtomicU64,
    heal_failure: AtomicU64,
    strategy_used: AtomicU64,
    steps_executed: AtomicU64,
    runs_created: AtomicU64,
    runs_passed: AtomicU64,
    runs_failed: AtomicU64,
}

/// Point-in-time copy of every counter, suitable for logging or
/// forwarding to whatever metrics sink the consumer runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub cache_hit_fast: u64,
    pub cache_hit_durable: u64,
    pub cache_miss: u64,
    pub volatile_selector_skipped: u64,
    pub drift_detected: u64,
    pub cache_invalidated: u64,
    pub heal_success: u64,
    pub heal_failure: u64,
    pub strategy_used: u64,
    pub steps_executed: u64,
    pub runs_created: u64,
    pub runs_passed: u64,
    pub runs_failed: u64,
}

macro_rules! counter_methods {
    ($($field:ident => $record:ident),* $(,)?) => {
        impl Telemetry {
            $(
                pub fn $record(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }
            )*

            pub fn snapshot(&self) -> TelemetrySnapshot {
                TelemetrySnapshot {
                    $(
                        $field: self.$field.load(Ordering::Relaxed),
                    )*
                }
            }

            pub fn reset(&self) {
                $(
                    self.$field.store(0, Ordering::Relaxed);
                )*
            }
        }
    };
}

counter_methods! {
    cache_hit_fast => record_cache_hit_fast,
    cache_hit_durable => record_cache_hit_durable,
    cache_miss => record_cache_miss,
    volatile_selector_skipped => record_volatile_selector_skipped,
    drift_detected => record_drift_detected,
    cache_invalidated => record_cache_invalidated,
    heal_success => record_heal_success,
    heal_failure => record_heal_failure,
    strategy_used => record_strategy_used,
    steps_executed => record_steps_executed,
    runs_created => record_runs_created,
    runs_passed => record_runs_passed,
    runs_failed => record_runs_failed,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_snapshots_independently() {
        let t = Telemetry::new();
        t.record_cache_hit_fast();
        t.record_cache_hit_fast();
        t.record_heal_success();
        let snap = t.snapshot();
        assert_eq!(snap.cache_hit_fast, 2);
        assert_eq!(snap.heal_success, 1);
        assert_eq!(snap.cache_miss, 0);
    }

    #[test]
    fn reset_zeroes_all_counters() {
        let t = Telemetry::new();
        t.record_runs_created();
        t.record_runs_passed();
        t.reset();
        let snap = t.snapshot();
        assert_eq!(snap, TelemetrySnapshot::default());
    }
}
