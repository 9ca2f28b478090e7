//! Thin time helpers so TTL math lives in one place.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix timestamp in seconds.
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as i64
}

/// Seconds remaining until `expires_at`, clamped to a minimum of 1 so a Store entry
/// written right before it logically expires still gets a TTL rather than zero.
pub fn ttl_seconds(expires_at: i64) -> u64 {
    let remaining = expires_at - now_unix();
    remaining.max(1) as u64
}

pub fn is_expired(expires_at: i64) -> bool {
    now_unix() >= expires_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_seconds_never_returns_zero() {
        assert_eq!(ttl_seconds(now_unix() - 1000), 1);
    }

    #[test]
    fn is_expired_detects_past_timestamps() {
        assert!(is_expired(now_unix() - 1));
        assert!(!is_expired(now_unix() + 1000));
    }
}
