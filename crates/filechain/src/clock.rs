//! Time sources for block timestamps.

use std::sync::atomic::{AtomicU64, Ordering};

use filechain_core::Timestamp;

/// Source of block creation times.
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

/// Deterministic clock: returns `start`, then advances by `step` on every read.
#[derive(Debug)]
pub struct ManualClock {
    next: AtomicU64,
    step: u64,
}

impl ManualClock {
    pub fn new(start: Timestamp, step_micros: u64) -> Self {
        Self {
            next: AtomicU64::new(start.as_micros()),
            step: step_micros,
        }
    }

    /// Move the clock to an arbitrary time, including backwards.
    pub fn set(&self, time: Timestamp) {
        self.next.store(time.as_micros(), Ordering::SeqCst);
    }

    /// The time the next read will return.
    pub fn peek(&self) -> Timestamp {
        Timestamp::from_micros(self.next.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.next.fetch_add(self.step, Ordering::SeqCst))
    }
}
