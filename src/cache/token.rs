/// Upstream access token together with the instant it stops being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at_unix_ts: i64, // UNIX TIMESTAMP, safety margin already applied
}

impl CachedToken {
    pub fn new(value: String, expires_at_unix_ts: i64) -> Self {
        Self { value, expires_at_unix_ts }
    }

    /// Build a token fetched at `fetched_at` with a nominal lifetime of `ttl_seconds`.
    ///
    /// A lifetime shorter than the margin still keeps the token for one second,
    /// so a short-lived upstream token is not refetched on every lookup.
    pub fn from_ttl(value: String, fetched_at: i64, ttl_seconds: i64, safety_margin_seconds: i64) -> Self {
        let expires_at = fetched_at
            .saturating_add(ttl_seconds)
            .saturating_sub(safety_margin_seconds)
            .max(fetched_at.saturating_add(ttl_seconds.min(1)));
        Self::new(value, expires_at)
    }

    pub fn is_valid_at(&self, now_unix_ts: i64) -> bool {
        !self.value.is_empty() && now_unix_ts < self.expires_at_unix_ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_subtracts_safety_margin() {
        let token = CachedToken::from_ttl("T1".into(), 1000, 7200, 300);
        assert_eq!(token.expires_at_unix_ts, 7900);
        assert!(token.is_valid_at(7899));
        assert!(!token.is_valid_at(7900));
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let token = CachedToken::from_ttl("T1".into(), 1000, i64::MAX, 300);
        assert_eq!(token.expires_at_unix_ts, i64::MAX - 300);
        assert!(token.is_valid_at(1000));
    }

    #[test]
    fn ttl_within_margin_is_kept_for_one_second() {
        let token = CachedToken::from_ttl("T1".into(), 1000, 100, 300);
        assert_eq!(token.expires_at_unix_ts, 1001);
        assert!(token.is_valid_at(1000));
        assert!(!token.is_valid_at(1001));
    }

    #[test]
    fn empty_value_is_never_valid() {
        let token = CachedToken::new(String::new(), i64::MAX);
        assert!(!token.is_valid_at(0));
    }
}
