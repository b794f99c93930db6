//! Defines the events broadcast by a running periodic schedule.
//!
//! Subscribers obtain a receiver from `PeriodicHandle::subscribe`. Events are
//! informational only; a lagging or absent subscriber never slows the loop.

/// Lifecycle of a single periodic run.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// Fired once, before the first wait begins.
    Started { period_seconds: f64 },
    /// Fired after each tick's callback returned successfully.
    Ticked {
        /// 1-based tick number, the same value passed to the callback.
        counter: u64,
        /// Milliseconds the tick's wait took, measured from when it was issued.
        elapsed_ms: i64,
    },
    /// Fired once when the loop observes the stop request.
    Stopped { ticks: u64 },
    /// Fired once when a callback error terminated the loop.
    Aborted { ticks: u64, reason: String },
}

impl SchedulerEvent {
    /// Returns `true` for the events after which no further event is sent.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped { .. } | Self::Aborted { .. })
    }
}
