//! Upstream error classification for release routing
//!
//! The request layer must call `release(key, exhausted)` exactly once per
//! lease, and `exhausted` must be true only for failures attributable to
//! the key itself (spent credit, revoked authorization), not for transient
//! upstream trouble. This module owns that decision so handlers do not
//! pattern-match response bodies ad hoc.

/// Body phrases in upstream 429 responses that mean the key's balance or
/// plan allowance is spent, as opposed to a transient per-minute rate limit.
const EXHAUSTION_PATTERNS: &[&str] = &[
    "insufficient credits",
    "insufficient_fund",
    "not enough points",
    "point balance",
    "usage limit",
    "quota exceeded",
];

/// Classify a 429 body: true when it signals spent quota rather than a
/// transient rate limit.
pub fn exhausted_429(body: &str) -> bool {
    let lower = body.to_lowercase();
    EXHAUSTION_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Decide the `exhausted` flag from an upstream HTTP status and body.
///
/// 401/403 mean the key is no longer authorized at its tier and 402 means
/// payment exhausted — both always count. 429 depends on the body. Timeouts
/// and 5xx are upstream trouble, never the key's fault.
pub fn is_key_exhausted(status: u16, body: &str) -> bool {
    match status {
        401 | 402 | 403 => true,
        429 => exhausted_429(body),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_429_insufficient_credits() {
        let body = r#"{"error":{"message":"Insufficient credits to complete this request"}}"#;
        assert!(exhausted_429(body));
    }

    #[test]
    fn exhausted_429_point_balance() {
        let body = r#"{"error":{"message":"Your point balance is too low"}}"#;
        assert!(exhausted_429(body));
    }

    #[test]
    fn exhausted_429_usage_limit() {
        let body = r#"{"error":{"message":"Monthly usage limit reached"}}"#;
        assert!(exhausted_429(body));
    }

    #[test]
    fn exhausted_429_is_case_insensitive() {
        let body = r#"{"error":{"message":"QUOTA EXCEEDED for this key"}}"#;
        assert!(exhausted_429(body));
    }

    #[test]
    fn plain_rate_limit_is_not_exhaustion() {
        let body = r#"{"error":{"message":"Rate limit exceeded, please slow down"}}"#;
        assert!(!exhausted_429(body));
        assert!(!is_key_exhausted(429, body));
    }

    #[test]
    fn empty_429_body_is_not_exhaustion() {
        assert!(!is_key_exhausted(429, ""));
    }

    #[test]
    fn auth_failures_always_count() {
        assert!(is_key_exhausted(401, "unauthorized"));
        assert!(is_key_exhausted(402, ""));
        assert!(is_key_exhausted(403, "forbidden"));
    }

    #[test]
    fn server_errors_never_count() {
        for status in [408, 500, 502, 503, 504] {
            assert!(!is_key_exhausted(status, "insufficient credits"));
        }
    }

    #[test]
    fn success_never_counts() {
        assert!(!is_key_exhausted(200, ""));
    }
}
