/// Strategy names the Discovery Engine's stable tiers (1-5, 7) report.
/// Kept here, not in `soulbrowser-discovery`, because admission (I1/I4,
/// P8) is this crate's invariant to enforce — Discovery is free to pass
/// whatever `stable` flag it computed, but the cache independently
/// checks the strategy name against this list before trusting it.
pub const STABLE_STRATEGIES: &[&str] = &[
    "aria-label",
    "aria-placeholder",
    "name",
    "placeholder",
    "label-for",
    "data-test-hook",
];

/// Strategy names the volatile tiers (6, 8) and selector overrides
/// report. Never eligible for admission regardless of the `stable` flag
/// a caller passes.
pub const VOLATILE_STRATEGIES: &[&str] = &["role-name", "id-class", "override"];

pub fn is_stable_strategy(strategy: &str) -> bool {
    STABLE_STRATEGIES.contains(&strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_and_volatile_lists_are_disjoint() {
        for s in STABLE_STRATEGIES {
            assert!(!VOLATILE_STRATEGIES.contains(s));
        }
    }
}
