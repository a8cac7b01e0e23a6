use sha1::{Digest, Sha1};

/// Digest a page's tag-name skeleton (text omitted) into the stable
/// string recorded as `dom_hash` (§4.2 drift detection). Callers build
/// the skeleton string from the live DOM (e.g. a depth-first walk
/// emitting tag names only) via the Browser Driver's `evaluate()`; this
/// crate only owns the hashing and distance math.
pub fn dom_skeleton_hash(skeleton: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(skeleton.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Hamming-like character distance between two digests, expressed as a
/// percentage of differing characters. Digests of unequal length (which
/// should not happen for two SHA-1 hex strings) are treated as maximally
/// different.
pub fn hash_distance_pct(a: &str, b: &str) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 100.0;
    }
    let differing = a.chars().zip(b.chars()).filter(|(x, y)| x != y).count();
    (differing as f64 / a.len() as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_hashes_have_zero_distance() {
        let h = dom_skeleton_hash("div>span>a");
        assert_eq!(hash_distance_pct(&h, &h), 0.0);
    }

    #[test]
    fn different_skeletons_report_nonzero_distance() {
        let h1 = dom_skeleton_hash("div>span>a");
        let h2 = dom_skeleton_hash("section>ul>li>li>li");
        assert!(hash_distance_pct(&h1, &h2) > 0.0);
    }
}
