//! Ledger time source.

use std::sync::atomic::{AtomicI64, Ordering};

/// Unix-seconds clock read by expiry checks.
pub trait Clock: Send + Sync {
    fn unix_timestamp(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Settable clock for simulations and tests.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    #[must_use]
    pub fn new(unix_timestamp: i64) -> Self {
        Self(AtomicI64::new(unix_timestamp))
    }

    pub fn set(&self, unix_timestamp: i64) {
        self.0.store(unix_timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn unix_timestamp(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
