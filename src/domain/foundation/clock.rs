//! Time source abstraction so window arithmetic can be tested.

use std::sync::atomic::{AtomicU64, Ordering};

use super::Timestamp;

/// Supplies the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    unix_secs: AtomicU64,
}

impl ManualClock {
    pub fn at_unix_secs(secs: u64) -> Self {
        Self {
            unix_secs: AtomicU64::new(secs),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.unix_secs.store(at.as_unix_secs(), Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.unix_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_secs(self.unix_secs.load(Ordering::SeqCst))
    }
}
