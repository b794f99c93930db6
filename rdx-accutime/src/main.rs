use accutime::prelude::*;
use anyhow::Result;
use chrono::{Local, TimeZone};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LIMIT_OF_ACCURACY_MS: i64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load configuration: optional file, then ACCUTIME_* overrides.
    let path = env::args().nth(1).unwrap_or_else(|| "accutime.toml".to_string());
    let config = AccuTimeConfig::load(&path)?;
    info!(?config, "loaded configuration from {}", path);

    // 3. Create the waiter.
    let waiter = Waiter::from_config(&config);

    // 4. Exercise the waits and the periodic scheduler.
    demo_waits(&waiter).await?;
    demo_periodic(&waiter).await?;

    Ok(())
}

/// Aligns to whole seconds and reports how close each wait landed.
async fn demo_waits(waiter: &Waiter) -> Result<()> {
    let aligned = waiter.wait_next_second(None).await;
    info!("[ALIGN] reached whole second after {} ms", aligned);

    for seconds in [1.0, 2.0] {
        let elapsed = waiter.wait_seconds(seconds, None).await;
        report(&format!("wait {seconds}s"), elapsed, (seconds * 1000.0) as i64);
    }

    let start = waiter.now_millis();
    let end = waiter.add_offset("00:00:03", Some(start))?;
    let label = match Local.timestamp_millis_opt(end).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => return Err(AccuTimeError::TimestampOutOfRange(end).into()),
    };
    let elapsed = waiter.wait_until_time_of_day(&label, Some(start)).await?;
    report(&format!("until {label}"), elapsed, 3000);
    Ok(())
}

/// Runs five one-second ticks and stops from inside the fifth callback.
async fn demo_periodic(waiter: &Waiter) -> Result<()> {
    let stop_slot = std::sync::Arc::new(std::sync::OnceLock::<StopHandle>::new());
    let slot = stop_slot.clone();
    let clock = waiter.clone();
    let mut last = waiter.now_millis();

    let run = waiter.start_periodic(1.0, move |n| {
        let now = clock.now_millis();
        report(&format!("tick #{n}"), now - last, 1000);
        last = now;
        if n == 5 {
            if let Some(stop) = slot.get() {
                stop.stop();
            }
        }
        Ok(())
    });
    stop_slot.set(run.stop_handle()).ok();

    let mut events = run.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("[SCHEDULER] => {:?}", event);
            if event.is_terminal() {
                break;
            }
        }
    });

    let ticks = run.join().await?;
    info!("[PERIODIC] finished after {} ticks", ticks);
    Ok(())
}

fn report(label: &str, elapsed: i64, expected: i64) {
    let drift = elapsed - expected;
    if drift.abs() < LIMIT_OF_ACCURACY_MS {
        info!("[{}] elapsed {} ms (drift {:+} ms)", label, elapsed, drift);
    } else {
        warn!("[{}] elapsed {} ms (drift {:+} ms)", label, elapsed, drift);
    }
}
