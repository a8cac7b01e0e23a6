use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};

/// Per-request context the cache needs to compute its two derived keys
/// (`url_pattern`, `session_scope`). Collaborator-supplied (§6); the
/// core never infers these from the driver itself.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub domain: String,
    pub path: String,
    pub auth_user: Option<String>,
    /// Monotonic identifier for the current login session. When absent,
    /// `session_scope` substitutes an hour bucket so entries cannot
    /// silently outlive a user session (§3, `SessionCacheEntry`).
    pub session_epoch: Option<u64>,
    /// Whether this domain is flagged as SPA-heavy, raising the drift
    /// threshold from 35% to 75% (§4.2, §6 `CACHE_DRIFT_THRESHOLD_PCT`).
    pub is_spa_heavy: bool,
}

impl SessionContext {
    pub fn new(domain: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
            auth_user: None,
            session_epoch: None,
            is_spa_heavy: false,
        }
    }

    pub fn with_auth_user(mut self, user: impl Into<String>) -> Self {
        self.auth_user = Some(user.into());
        self
    }

    pub fn with_session_epoch(mut self, epoch: u64) -> Self {
        self.session_epoch = Some(epoch);
        self
    }

    pub fn spa_heavy(mut self) -> Self {
        self.is_spa_heavy = true;
        self
    }
}

/// Compute the `url_pattern` key (§4.2 step 1): strip the query string
/// and replace a trailing pure-integer path segment with a wildcard
/// token, so `/orders/4821?tab=history` and `/orders/77` collapse to
/// the same pattern `/orders/{id}`.
pub fn normalize_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    let without_fragment = without_query.split('#').next().unwrap_or(without_query);
    let trimmed = without_fragment.trim_end_matches('/');

    match trimmed.rsplit_once('/') {
        Some((head, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => {
            format!("{head}/{{id}}")
        }
        _ => trimmed.to_string(),
    }
}

/// Compute `session_scope`: 12 hex characters of a SHA-1 digest over
/// `(domain, path, auth_user, session_epoch)`, falling back to an hour
/// bucket when `session_epoch` is unknown (§3, supplemented in
/// SPEC_FULL §10 from the original's `_session_key`).
pub fn session_scope(ctx: &SessionContext, now: DateTime<Utc>) -> String {
    let epoch_component = ctx
        .session_epoch
        .map(|e| e.to_string())
        .unwrap_or_else(|| format!("hour-{}", now.format("%Y%m%d%H")));

    let mut hasher = Sha1::new();
    hasher.update(ctx.domain.as_bytes());
    hasher.update(b"|");
    hasher.update(ctx.path.as_bytes());
    hasher.update(b"|");
    hasher.update(ctx.auth_user.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(epoch_component.as_bytes());

    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_query_string() {
        assert_eq!(normalize_url("https://x.com/a?b=1"), "https://x.com/a");
    }

    #[test]
    fn wildcards_trailing_integer_segment() {
        assert_eq!(
            normalize_url("https://x.com/orders/4821?tab=history"),
            "https://x.com/orders/{id}"
        );
        assert_eq!(
            normalize_url("https://x.com/orders/77"),
            "https://x.com/orders/{id}"
        );
    }

    #[test]
    fn leaves_non_numeric_segments_alone() {
        assert_eq!(normalize_url("https://x.com/orders/new"), "https://x.com/orders/new");
    }

    #[test]
    fn session_scope_is_twelve_hex_chars() {
        let ctx = SessionContext::new("x.com", "/a").with_session_epoch(7);
        let scope = session_scope(&ctx, Utc::now());
        assert_eq!(scope.len(), 12);
        assert!(scope.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_scope_differs_by_epoch() {
        let ctx1 = SessionContext::new("x.com", "/a").with_session_epoch(1);
        let ctx2 = SessionContext::new("x.com", "/a").with_session_epoch(2);
        let now = Utc::now();
        assert_ne!(session_scope(&ctx1, now), session_scope(&ctx2, now));
    }

    #[test]
    fn session_scope_falls_back_to_hour_bucket_without_epoch() {
        let ctx = SessionContext::new("x.com", "/a");
        let now = Utc::now();
        assert_eq!(session_scope(&ctx, now), session_scope(&ctx, now));
    }
}
