#![allow(dead_code)]

use accutime::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};

/// A clock that advances by `step` milliseconds on every read.
pub struct StepClock {
    now: AtomicI64,
    step: i64,
}

impl StepClock {
    pub fn new(start: Millis, step: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now_millis(&self) -> Millis {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

/// Config that keeps the waiter in pure yield-and-recheck mode, so a fake
/// clock never triggers a real sleep.
pub fn polling_config() -> AccuTimeConfig {
    AccuTimeConfig {
        coarse_threshold_ms: 0,
        ..Default::default()
    }
}

pub fn stepping_waiter(start: Millis) -> Waiter {
    Waiter::from_config(&polling_config()).with_clock(StepClock::new(start, 1))
}
