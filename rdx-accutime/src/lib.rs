//! # Accutime
//!
//! Clock-drift-compensated waiting primitives for async Rust.
//!
//! Timer APIs are coarse: a plain sleep wakes "some time after" the deadline.
//! Accutime resolves a target instant on a whole-second boundary and polls the
//! real clock near that boundary, applying a tunable compensation offset so the
//! wait resolves as close to the boundary as the scheduler allows.
//!
//! ## Core Concepts
//!
//! - **Waiter**: owns a clock and a compensation offset. `wait_seconds` aligns
//!   to whole seconds; `wait_until_time_of_day` targets an `HH:mm:ss` on the
//!   local calendar day.
//! - **Compensation**: a shared millisecond offset, `-1` by default, read on
//!   every poll. Waiters may share one or keep their own.
//! - **Periodic runs**: `start_periodic` ticks a callback every N whole seconds
//!   until stopped.
//! - **Time-of-day helpers**: parsing and component arithmetic on `HH:mm:ss`
//!   strings, and their conversion into epoch milliseconds.
//!
//! The free functions at the crate root operate on a process-wide default
//! `Waiter` built from `AccuTimeConfig::default()`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use accutime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Build a waiter from configuration.
//!     let waiter = Waiter::from_config(&AccuTimeConfig::load("accutime.toml")?);
//!
//!     // 2. Align to the next whole second, then wait two more.
//!     waiter.wait_next_second(None).await;
//!     let elapsed = waiter.wait_seconds(2.0, None).await;
//!     println!("waited {elapsed} ms");
//!
//!     // 3. Tick every second until stopped.
//!     let run = waiter.start_periodic(1.0, |n| {
//!         println!("tick #{n}");
//!         Ok(())
//!     });
//!     waiter.wait_seconds(5.0, None).await;
//!     run.stop();
//!     run.join().await?;
//!
//!     Ok(())
//! }
//! ```

pub const LIBRARY_NAME: &str = "Accutime";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod clock;
pub mod common;
pub mod config;
pub mod error;
pub mod events;
pub mod periodic;
pub mod timeofday;
pub mod waiter;

use crate::common::Millis;
use crate::error::Result;
use crate::periodic::PeriodicHandle;
use crate::waiter::Waiter;
use std::sync::OnceLock;

pub use crate::timeofday::{add_time_string, parse_time_string, subtract_time_string};

/// A prelude module for easy importing of the most common Accutime types.
pub mod prelude {
    pub use crate::clock::{Clock, Compensation, SystemClock};
    pub use crate::common::Millis;
    pub use crate::config::{AccuTimeConfig, RangeCheck};
    pub use crate::error::AccuTimeError;
    pub use crate::events::SchedulerEvent;
    pub use crate::periodic::{PeriodicHandle, StopHandle};
    pub use crate::timeofday::{Hms, TimeOfDay};
    pub use crate::waiter::Waiter;
}

static DEFAULT_WAITER: OnceLock<Waiter> = OnceLock::new();

/// The process-wide waiter behind the crate-root functions.
pub fn default_waiter() -> &'static Waiter {
    DEFAULT_WAITER.get_or_init(Waiter::new)
}

/// Current system time in epoch milliseconds.
pub fn now_millis() -> Millis {
    default_waiter().now_millis()
}

/// Sets the default waiter's compensation offset and returns it.
pub fn set_compensation(ms: Millis) -> Millis {
    default_waiter().set_compensation(ms)
}

pub fn get_compensation() -> Millis {
    default_waiter().get_compensation()
}

/// See [`Waiter::wait_seconds`].
pub async fn wait_seconds(seconds: f64, start: Option<Millis>) -> Millis {
    default_waiter().wait_seconds(seconds, start).await
}

/// See [`Waiter::wait_next_second`].
pub async fn wait_next_second(start: Option<Millis>) -> Millis {
    default_waiter().wait_next_second(start).await
}

/// See [`Waiter::wait_until_time_of_day`].
pub async fn wait_until_time_of_day(time_of_day: &str, start: Option<Millis>) -> Result<Millis> {
    default_waiter().wait_until_time_of_day(time_of_day, start).await
}

/// See [`Waiter::resolve_time_of_day`].
pub fn resolve_time_of_day(time_of_day: &str, start: Option<Millis>) -> Result<Millis> {
    default_waiter().resolve_time_of_day(time_of_day, start)
}

/// See [`Waiter::add_offset`].
pub fn add_offset(time_of_day: &str, start: Option<Millis>) -> Result<Millis> {
    default_waiter().add_offset(time_of_day, start)
}

/// See [`Waiter::start_periodic`].
pub fn start_periodic<F>(period_seconds: f64, on_tick: F) -> PeriodicHandle
where
    F: FnMut(u64) -> anyhow::Result<()> + Send + 'static,
{
    default_waiter().start_periodic(period_seconds, on_tick)
}
