use chrono::Utc;
use tokio::time::Instant;

/// Source of "now" for token expiry decisions, in UNIX seconds.
pub trait Clock: Send + Sync {
    fn now_unix_ts(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_ts(&self) -> i64 {
        now_i64()
    }
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

#[cfg(test)]
pub mod manual {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::Clock;

    /// Test clock that only moves when told to.
    #[derive(Debug, Default)]
    pub struct ManualClock(AtomicI64);

    impl ManualClock {
        pub fn at(unix_ts: i64) -> Self {
            Self(AtomicI64::new(unix_ts))
        }

        pub fn set(&self, unix_ts: i64) {
            self.0.store(unix_ts, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_unix_ts(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }
}
