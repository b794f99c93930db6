//! The drift-corrected waiter.
//!
//! A wait turns a requested delay into an absolute target on a whole-second
//! boundary, then re-reads the clock until `now + compensation >= target`.
//! Far from the target it sleeps coarsely; within `coarse_threshold_ms` it
//! yields to the runtime and re-checks on every scheduler turn, so the
//! boundary is observed with sub-tick latency rather than timer-wheel latency.
//!
//! There is no timeout: if the clock stalls or jumps backwards far enough, a
//! wait never resolves. A single wait cannot be cancelled other than by
//! dropping its future.

use crate::clock::{Clock, Compensation, SystemClock};
use crate::common::{Millis, MILLIS_PER_SECOND};
use crate::config::{AccuTimeConfig, RangeCheck};
use crate::error::Result;
use crate::timeofday::TimeOfDay;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Delay used by [`Waiter::wait_next_second`].
pub const DEFAULT_WAIT_SECONDS: f64 = 1.0;

/// Resolves delays and time-of-day targets and suspends until they are reached.
///
/// A `Waiter` is cheap to clone; clones share the clock and the compensation
/// offset.
#[derive(Clone)]
pub struct Waiter {
    clock: Arc<dyn Clock>,
    compensation: Compensation,
    coarse_threshold_ms: u64,
    range_check: RangeCheck,
    pub(crate) event_capacity: usize,
}

impl Waiter {
    /// A waiter on the system clock with the default configuration.
    pub fn new() -> Self {
        Self::from_config(&AccuTimeConfig::default())
    }

    /// A waiter on the system clock with its own compensation offset
    /// initialized from `config`.
    pub fn from_config(config: &AccuTimeConfig) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            compensation: Compensation::new(config.compensation_ms),
            coarse_threshold_ms: config.coarse_threshold_ms,
            range_check: config.range_check,
            event_capacity: config.event_capacity.max(1),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Shares `compensation` with this waiter instead of its own offset.
    pub fn with_compensation(mut self, compensation: Compensation) -> Self {
        self.compensation = compensation;
        self
    }

    pub fn compensation(&self) -> &Compensation {
        &self.compensation
    }

    /// Stores a new compensation offset; in-flight waits see it on their next poll.
    pub fn set_compensation(&self, ms: Millis) -> Millis {
        self.compensation.set(ms)
    }

    pub fn get_compensation(&self) -> Millis {
        self.compensation.get()
    }

    pub fn range_check(&self) -> RangeCheck {
        self.range_check
    }

    pub fn now_millis(&self) -> Millis {
        self.clock.now_millis()
    }

    /// Parses `text` with this waiter's range policy.
    pub fn parse(&self, text: &str) -> Result<TimeOfDay> {
        TimeOfDay::parse_with(text, self.range_check)
    }

    /// Absolute timestamp of `time_of_day` on the local day of `start`
    /// (default: now).
    pub fn resolve_time_of_day(&self, time_of_day: &str, start: Option<Millis>) -> Result<Millis> {
        let start = start.unwrap_or_else(|| self.now_millis());
        self.parse(time_of_day)?.resolve_on(start)
    }

    /// `start` (default: now) plus `time_of_day` read as a duration.
    pub fn add_offset(&self, time_of_day: &str, start: Option<Millis>) -> Result<Millis> {
        let start = start.unwrap_or_else(|| self.now_millis());
        Ok(self.parse(time_of_day)?.offset_from(start))
    }

    /// The whole-second instant a wait of `seconds` from `start` aims for:
    /// `floor(start / 1000 + seconds) * 1000`, saturating at the `i64` bounds.
    ///
    /// NaN counts as zero seconds. Negative delays land on an already passed
    /// boundary; `f64::INFINITY` saturates to `i64::MAX`, a target never reached.
    pub fn target_timestamp(seconds: f64, start: Millis) -> Millis {
        let seconds = if seconds.is_nan() { 0.0 } else { seconds };
        let whole = (start as f64 / MILLIS_PER_SECOND as f64 + seconds).floor();
        // Float-to-int `as` saturates.
        (whole as Millis).saturating_mul(MILLIS_PER_SECOND)
    }

    /// Waits until the next whole-second boundary `seconds` after `start`
    /// (default: now) and returns the milliseconds elapsed since `start`.
    ///
    /// `wait_seconds(1.0, None)` therefore aligns the caller to the next
    /// whole second rather than sleeping a full second; see
    /// [`Waiter::wait_next_second`]. See [`Waiter::target_timestamp`] for
    /// how NaN, negative and infinite delays are treated. The waiter always
    /// yields to the runtime at least once, even when the target has passed.
    pub async fn wait_seconds(&self, seconds: f64, start: Option<Millis>) -> Millis {
        let start = start.unwrap_or_else(|| self.now_millis());
        let target = Self::target_timestamp(seconds, start);
        debug!(seconds, start, target_ms = target, "wait_seconds");

        let reached = self.poll_until(target).await;
        let elapsed = reached.saturating_sub(start);
        debug!(seconds, start, reached, elapsed, "wait_seconds resolved");
        elapsed
    }

    /// `wait_seconds` with the default delay of [`DEFAULT_WAIT_SECONDS`]:
    /// resolves on the next whole second after `start` (default: now).
    pub async fn wait_next_second(&self, start: Option<Millis>) -> Millis {
        self.wait_seconds(DEFAULT_WAIT_SECONDS, start).await
    }

    /// Waits until `time_of_day` on the local day of `start` (default: now).
    ///
    /// The elapsed time is measured from `start`, not from the resolved target.
    /// A time-of-day already in the past resolves immediately.
    pub async fn wait_until_time_of_day(
        &self,
        time_of_day: &str,
        start: Option<Millis>,
    ) -> Result<Millis> {
        let parsed = self.parse(time_of_day)?;
        self.wait_until(&parsed, start).await
    }

    /// Same as [`Waiter::wait_until_time_of_day`] with a parsed value.
    pub async fn wait_until(&self, time_of_day: &TimeOfDay, start: Option<Millis>) -> Result<Millis> {
        let start = start.unwrap_or_else(|| self.now_millis());
        let resolved = time_of_day.resolve_on(start)?;
        debug!(%time_of_day, start, resolved, "wait_until_time_of_day");

        self.wait_seconds(0.0, Some(resolved)).await;
        let elapsed = self.now_millis().saturating_sub(start);
        debug!(%time_of_day, start, elapsed, "wait_until_time_of_day resolved");
        Ok(elapsed)
    }

    /// Suspends until `now + compensation >= target`; returns the `now` that
    /// satisfied the predicate.
    async fn poll_until(&self, target: Millis) -> Millis {
        let threshold = i64::try_from(self.coarse_threshold_ms).unwrap_or(i64::MAX);
        let mut fine = false;
        // Suspend at least once so a past target still lets other tasks run.
        tokio::task::yield_now().await;
        loop {
            let now = self.clock.now_millis();
            let remaining = target.saturating_sub(now.saturating_add(self.compensation.get()));
            if remaining <= 0 {
                return now;
            }
            if threshold > 0 && remaining > threshold {
                let coarse = (remaining - threshold) as u64;
                tokio::time::sleep(Duration::from_millis(coarse)).await;
            } else {
                if !fine {
                    trace!(target_ms = target, remaining, "switching to fine polling");
                    fine = true;
                }
                tokio::task::yield_now().await;
            }
        }
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("compensation", &self.compensation.get())
            .field("coarse_threshold_ms", &self.coarse_threshold_ms)
            .field("range_check", &self.range_check)
            .finish_non_exhaustive()
    }
}
