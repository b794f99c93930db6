//! The periodic scheduler: whole-second ticks driven by the waiter.
//!
//! A run is a spawned task owning a `while running { wait; tick }` loop. The
//! caller only gets stop capability, tick count and an event stream. The
//! running flag is checked between ticks, not during a wait: stopping while a
//! wait is in progress lets that wait finish and its callback fire once more.

use crate::error::{AccuTimeError, Result};
use crate::events::SchedulerEvent;
use crate::waiter::Waiter;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, trace};

/// Cloneable capability to stop a periodic run.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Requests the run to stop. Calling it again has no further effect.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("periodic run stopped by user");
        }
    }

    /// `false` once a stop was requested or the loop aborted.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Owner-side handle to a periodic run started by [`Waiter::start_periodic`].
///
/// Dropping the handle does not stop the run.
#[derive(Debug)]
pub struct PeriodicHandle {
    stop: StopHandle,
    ticks: Arc<AtomicU64>,
    period_seconds: f64,
    events: broadcast::Sender<SchedulerEvent>,
    task: JoinHandle<Result<u64>>,
}

impl PeriodicHandle {
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// `true` while the loop may still produce ticks.
    pub fn is_running(&self) -> bool {
        self.stop.is_running() && !self.task.is_finished()
    }

    /// Number of ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn period_seconds(&self) -> f64 {
        self.period_seconds
    }

    /// Subscribes to this run's [`SchedulerEvent`]s from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events.subscribe()
    }

    /// Waits for the loop to end and returns the number of completed ticks.
    ///
    /// Never returns unless the run was stopped or a callback failed.
    pub async fn join(self) -> Result<u64> {
        match self.task.await {
            Ok(result) => result,
            Err(join_error) => Err(AccuTimeError::Aborted(join_error.to_string())),
        }
    }
}

impl Waiter {
    /// Invokes `on_tick(n)` after every `period_seconds`-long whole-second
    /// wait, with `n` counting from 1, until stopped.
    ///
    /// Each wait is measured from the moment the previous tick ended, so
    /// lateness does not accumulate. If `on_tick` returns an error the error is
    /// logged, the loop ends, and [`PeriodicHandle::join`] reports
    /// [`AccuTimeError::CallbackFailed`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_periodic<F>(&self, period_seconds: f64, mut on_tick: F) -> PeriodicHandle
    where
        F: FnMut(u64) -> anyhow::Result<()> + Send + 'static,
    {
        info!(period_seconds, "starting periodic run");
        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));
        let (events, _) = broadcast::channel(self.event_capacity);

        let waiter = self.clone();
        let loop_running = running.clone();
        let loop_ticks = ticks.clone();
        let loop_events = events.clone();
        let task = tokio::spawn(async move {
            loop_events
                .send(SchedulerEvent::Started { period_seconds })
                .ok();
            let mut counter = 0u64;
            while loop_running.load(Ordering::Acquire) {
                let elapsed_ms = waiter.wait_seconds(period_seconds, None).await;
                counter += 1;
                loop_ticks.store(counter, Ordering::Release);
                trace!(counter, elapsed_ms, "periodic tick");

                if let Err(source) = on_tick(counter) {
                    loop_running.store(false, Ordering::Release);
                    error!(counter, error = %source, "periodic callback failed, aborting run");
                    loop_events
                        .send(SchedulerEvent::Aborted {
                            ticks: counter,
                            reason: source.to_string(),
                        })
                        .ok();
                    return Err(AccuTimeError::CallbackFailed {
                        tick: counter,
                        source,
                    });
                }
                loop_events
                    .send(SchedulerEvent::Ticked {
                        counter,
                        elapsed_ms,
                    })
                    .ok();
            }
            info!(ticks = counter, "periodic run finished");
            loop_events.send(SchedulerEvent::Stopped { ticks: counter }).ok();
            Ok(counter)
        });

        PeriodicHandle {
            stop: StopHandle { running },
            ticks,
            period_seconds,
            events,
            task,
        }
    }
}
