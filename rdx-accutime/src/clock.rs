//! The time sources a `Waiter` polls, and the compensation offset applied to them.

use crate::common::Millis;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Default compensation: resolve one millisecond past the target.
pub const DEFAULT_COMPENSATION_MS: Millis = -1;

/// A source of "current time in milliseconds since the epoch".
///
/// The only requirement is that it is monotonic enough for a polling loop to
/// terminate. Tests substitute a stepping clock.
pub trait Clock: Send + Sync + 'static {
    fn now_millis(&self) -> Millis;
}

/// The host's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Millis {
        Utc::now().timestamp_millis()
    }
}

/// A shared, atomically updated compensation offset in milliseconds.
///
/// Cloning yields another handle to the same value, so every `Waiter` built
/// from a clone observes writes made through any of them. Use
/// `Compensation::new` for an independent offset.
#[derive(Debug, Clone)]
pub struct Compensation {
    offset: Arc<AtomicI64>,
}

impl Compensation {
    pub fn new(ms: Millis) -> Self {
        Self {
            offset: Arc::new(AtomicI64::new(ms)),
        }
    }

    /// Stores `ms` as the current offset and returns it.
    pub fn set(&self, ms: Millis) -> Millis {
        self.offset.store(ms, Ordering::Release);
        ms
    }

    pub fn get(&self) -> Millis {
        self.offset.load(Ordering::Acquire)
    }
}

impl Default for Compensation {
    fn default() -> Self {
        Self::new(DEFAULT_COMPENSATION_MS)
    }
}
