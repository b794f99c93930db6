//! Wall-clock accuracy of the waits. These take ~20 s and run one at a time so
//! busy polling in one test does not skew another.

use accutime::prelude::*;
use chrono::{Local, TimeZone};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

const LIMIT_OF_ACCURACY_MS: i64 = 10;

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn assert_close(elapsed: i64, expected: i64) {
    assert!(
        (elapsed - expected).abs() < LIMIT_OF_ACCURACY_MS,
        "elapsed {elapsed} ms, expected {expected} ms"
    );
}

#[tokio::test]
async fn wait_seconds_lands_on_whole_seconds() {
    let _guard = serial();
    let waiter = Waiter::new();
    waiter.wait_seconds(1.0, None).await;

    for _ in 0..2 {
        assert_close(waiter.wait_seconds(1.0, None).await, 1_000);
    }
    assert_close(waiter.wait_seconds(2.0, None).await, 2_000);
    assert_close(waiter.wait_seconds(5.0, None).await, 5_000);
}

#[tokio::test]
async fn wait_until_time_of_day_hits_the_wall_clock() {
    let _guard = serial();
    let waiter = Waiter::new();
    waiter.wait_seconds(1.0, None).await;

    let start = waiter.now_millis();
    let end = waiter.add_offset("00:00:05", Some(start)).unwrap();
    let label = Local
        .timestamp_millis_opt(end)
        .unwrap()
        .format("%H:%M:%S")
        .to_string();

    let elapsed = waiter.wait_until_time_of_day(&label, Some(start)).await.unwrap();
    assert_close(elapsed, 5_000);
}

#[tokio::test]
async fn periodic_ticks_are_a_second_apart() {
    let _guard = serial();
    let waiter = Waiter::new();
    waiter.wait_seconds(1.0, None).await;

    let samples = Arc::new(Mutex::new(Vec::new()));
    let slot = Arc::new(OnceLock::<StopHandle>::new());
    let sink = samples.clone();
    let inner = slot.clone();
    let clock = waiter.clone();
    let mut last = waiter.now_millis();

    let run = waiter.start_periodic(1.0, move |n| {
        let now = clock.now_millis();
        sink.lock().unwrap().push((n, now - last));
        last = now;
        if n == 5 {
            inner.get().expect("stop handle installed").stop();
        }
        Ok(())
    });
    slot.set(run.stop_handle()).unwrap();

    assert_eq!(run.join().await.unwrap(), 5);
    let samples = samples.lock().unwrap();
    let counters: Vec<u64> = samples.iter().map(|(n, _)| *n).collect();
    assert_eq!(counters, vec![1, 2, 3, 4, 5]);
    for (_, spacing) in samples.iter() {
        assert_close(*spacing, 1_000);
    }
}

#[tokio::test]
async fn sub_second_period_does_not_hog_the_runtime() {
    let _guard = serial();
    let waiter = Waiter::new();
    waiter.wait_next_second(None).await;

    // Half a second past the boundary, every 0.5 s target is already behind.
    let run = waiter.start_periodic(0.5, |_| Ok(()));
    let before = Instant::now();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let slept = before.elapsed();
    assert!(slept < Duration::from_millis(100), "5 ms sleep took {slept:?}");

    run.stop();
    let joined = tokio::time::timeout(Duration::from_secs(2), run.join()).await;
    assert!(matches!(joined, Ok(Ok(_))));
}
