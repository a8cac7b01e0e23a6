/// Readiness/timeout profile override. `Static` pages skip the
/// SPA-readiness predicate in Discovery's pre-stabilization step;
/// `Dynamic` always waits for it. Unset lets each page be probed on its
/// own merits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadinessProfile {
    Static,
    Dynamic,
}

/// The six recognized configuration options of §6, parsed once into an
/// immutable struct at run start. Never re-read from the environment
/// mid-run (see DESIGN NOTES, "Configuration object").
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub max_heal_rounds: u32,
    pub fast_cache_ttl_seconds: u64,
    pub durable_cache_retention_days: u64,
    pub cache_drift_threshold_pct: f64,
    pub discovery_per_call_timeout_seconds: u64,
    pub enable_memory: bool,
    pub profile_override: Option<ReadinessProfile>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_heal_rounds: 3,
            fast_cache_ttl_seconds: 3600,
            durable_cache_retention_days: 7,
            cache_drift_threshold_pct: 35.0,
            discovery_per_call_timeout_seconds: 60,
            enable_memory: true,
            profile_override: None,
        }
    }
}

impl EngineConfig {
    /// Read the six recognized environment variables once. Intended to
    /// be called a single time at process/run start; the result is then
    /// threaded through as an immutable value, never re-consulted.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_heal_rounds: env_u32("MAX_HEAL_ROUNDS", defaults.max_heal_rounds),
            fast_cache_ttl_seconds: env_u64(
                "FAST_CACHE_TTL_SECONDS",
                defaults.fast_cache_ttl_seconds,
            ),
            durable_cache_retention_days: env_u64(
                "DURABLE_CACHE_RETENTION_DAYS",
                defaults.durable_cache_retention_days,
            ),
            cache_drift_threshold_pct: env_f64(
                "CACHE_DRIFT_THRESHOLD_PCT",
                defaults.cache_drift_threshold_pct,
            ),
            discovery_per_call_timeout_seconds: env_u64(
                "DISCOVERY_PER_CALL_TIMEOUT_SECONDS",
                defaults.discovery_per_call_timeout_seconds,
            ),
            enable_memory: env_bool("ENABLE_MEMORY", defaults.enable_memory),
            profile_override: std::env::var("PROFILE_OVERRIDE")
                .ok()
                .and_then(|v| match v.to_ascii_uppercase().as_str() {
                    "STATIC" => Some(ReadinessProfile::Static),
                    "DYNAMIC" => Some(ReadinessProfile::Dynamic),
                    _ => None,
                }),
        }
    }

    /// Drift threshold for a domain, honoring the SPA-heavy override
    /// described in §4.2 (default 35%, 75% for flagged SPA domains).
    pub fn drift_threshold_for(&self, is_spa_heavy: bool) -> f64 {
        if is_spa_heavy {
            self.cache_drift_threshold_pct.max(75.0)
        } else {
            self.cache_drift_threshold_pct
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_heal_rounds, 3);
        assert_eq!(cfg.fast_cache_ttl_seconds, 3600);
        assert_eq!(cfg.durable_cache_retention_days, 7);
        assert_eq!(cfg.cache_drift_threshold_pct, 35.0);
        assert_eq!(cfg.discovery_per_call_timeout_seconds, 60);
        assert!(cfg.enable_memory);
        assert!(cfg.profile_override.is_none());
    }

    #[test]
    fn spa_domains_raise_drift_threshold() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.drift_threshold_for(false), 35.0);
        assert_eq!(cfg.drift_threshold_for(true), 75.0);
    }
}
