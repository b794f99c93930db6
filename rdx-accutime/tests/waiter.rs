mod common;

use accutime::prelude::*;
use common::{polling_config, stepping_waiter, StepClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn target_is_floored_to_whole_seconds() {
    assert_eq!(Waiter::target_timestamp(1.0, 10_500), 11_000);
    assert_eq!(Waiter::target_timestamp(0.0, 10_500), 10_000);
    assert_eq!(Waiter::target_timestamp(0.0, 10_000), 10_000);
    assert_eq!(Waiter::target_timestamp(2.0, 10_999), 12_000);
    assert_eq!(Waiter::target_timestamp(0.5, 10_400), 10_000);
    assert_eq!(Waiter::target_timestamp(0.5, 10_600), 11_000);
}

#[test]
fn target_saturates_and_ignores_nan() {
    assert_eq!(Waiter::target_timestamp(1e18, 0), i64::MAX);
    assert_eq!(Waiter::target_timestamp(f64::INFINITY, 0), i64::MAX);
    assert_eq!(Waiter::target_timestamp(f64::NEG_INFINITY, 0), i64::MIN);
    assert_eq!(Waiter::target_timestamp(f64::NAN, 10_500), 10_000);
    assert_eq!(Waiter::target_timestamp(-2.0, 10_500), 8_000);
}

#[tokio::test]
async fn wait_resolves_once_compensated_clock_reaches_target() {
    let waiter = stepping_waiter(10_500);
    // Default compensation -1: resolves at the first reading >= 11_001.
    assert_eq!(waiter.wait_seconds(1.0, Some(10_500)).await, 501);

    let waiter = stepping_waiter(10_500);
    waiter.set_compensation(0);
    assert_eq!(waiter.wait_seconds(1.0, Some(10_500)).await, 500);

    let waiter = stepping_waiter(10_500);
    waiter.set_compensation(100);
    assert_eq!(waiter.wait_seconds(1.0, Some(10_500)).await, 400);
}

#[tokio::test]
async fn zero_delay_on_a_past_target_returns_immediately() {
    let waiter = stepping_waiter(50_000);
    waiter.set_compensation(0);
    assert_eq!(waiter.wait_seconds(0.0, Some(50_000)).await, 0);
    // Under the default offset the boundary itself is not yet "reached".
    let waiter = stepping_waiter(50_000);
    assert_eq!(waiter.wait_seconds(0.0, Some(50_000)).await, 1);
}

#[tokio::test]
async fn default_start_is_the_current_reading() {
    let waiter = stepping_waiter(7_250);
    // start = 7_250 (first read), target 8_000, resolves at 8_001.
    assert_eq!(waiter.wait_seconds(1.0, None).await, 751);
}

#[tokio::test]
async fn waiters_share_or_isolate_compensation() {
    let shared = Compensation::default();
    let a = Waiter::new().with_compensation(shared.clone());
    let b = Waiter::new().with_compensation(shared.clone());
    let c = Waiter::new();

    assert_eq!(a.set_compensation(-7), -7);
    assert_eq!(b.get_compensation(), -7);
    assert_eq!(shared.get(), -7);
    assert_eq!(c.get_compensation(), -1);

    assert_eq!(b.set_compensation(0), 0);
    assert_eq!(a.get_compensation(), 0);
}

#[tokio::test]
async fn wait_until_measures_from_the_original_start() {
    let reference = 1_700_000_000_000;
    let anchor = stepping_waiter(0)
        .resolve_time_of_day("10:00:00", Some(reference))
        .unwrap();
    let start = anchor - 250;
    let waiter = Waiter::from_config(&polling_config()).with_clock(StepClock::new(start, 1));

    let elapsed = waiter
        .wait_until_time_of_day("10:00:00", Some(start))
        .await
        .unwrap();
    assert!((250..=260).contains(&elapsed), "elapsed = {elapsed}");
}

#[tokio::test]
async fn wait_until_a_past_time_resolves_immediately() {
    let reference = 1_700_000_000_000;
    let anchor = stepping_waiter(0)
        .resolve_time_of_day("10:00:00", Some(reference))
        .unwrap();
    let start = anchor + 5_000;
    let waiter = Waiter::from_config(&polling_config()).with_clock(StepClock::new(start, 1));

    let elapsed = waiter.wait_until_time_of_day("10:00:00", Some(start)).await.unwrap();
    assert!(elapsed < 5, "elapsed = {elapsed}");
}

#[tokio::test]
async fn wait_until_rejects_malformed_time_without_waiting() {
    let waiter = stepping_waiter(0);
    let err = waiter
        .wait_until_time_of_day("25:00:00", Some(0))
        .await
        .unwrap_err();
    assert!(matches!(err, AccuTimeError::InvalidFormat { .. }));
}

#[test]
fn waiter_helpers_follow_the_range_policy() {
    let strict = Waiter::new();
    assert!(strict.add_offset("00:61:00", Some(0)).is_err());
    assert_eq!(strict.add_offset("00:23:45", Some(5)).unwrap(), 5 + 1_425_000);

    let relaxed = Waiter::from_config(&AccuTimeConfig {
        range_check: RangeCheck::Relaxed,
        ..Default::default()
    });
    assert_eq!(relaxed.add_offset("00:61:00", Some(0)).unwrap(), 61 * 60_000);
    assert_eq!(relaxed.parse("48:00:00").unwrap(), TimeOfDay::new(48, 0, 0));
    assert_eq!(
        relaxed.resolve_time_of_day("24:00:00", Some(1_700_000_000_000)).unwrap()
            - relaxed.resolve_time_of_day("23:00:00", Some(1_700_000_000_000)).unwrap(),
        3_600_000
    );
}

#[tokio::test]
async fn wait_next_second_uses_the_one_second_default() {
    let waiter = stepping_waiter(7_250);
    assert_eq!(waiter.wait_next_second(Some(7_250)).await, 751);
}

#[tokio::test]
async fn nan_and_negative_delays_resolve_at_once() {
    let waiter = stepping_waiter(10_500);
    assert_eq!(waiter.wait_seconds(f64::NAN, Some(10_500)).await, 0);
    let waiter = stepping_waiter(10_500);
    assert_eq!(waiter.wait_seconds(-3.0, Some(10_500)).await, 0);
}

#[tokio::test]
async fn past_target_still_yields_to_other_tasks() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    tokio::spawn(async move {
        flag.store(true, Ordering::SeqCst);
    });

    let waiter = stepping_waiter(5_000);
    waiter.set_compensation(0);
    assert_eq!(waiter.wait_seconds(0.0, Some(5_000)).await, 0);
    assert!(ran.load(Ordering::SeqCst), "sibling task never ran during the wait");
}

#[tokio::test]
async fn extreme_compensation_does_not_overflow() {
    let waiter = stepping_waiter(10_500);
    waiter.set_compensation(i64::MAX);
    assert_eq!(waiter.wait_seconds(1.0, Some(10_500)).await, 0);

    // The compensated clock can never catch up; the wait must keep polling
    // without panicking until the timeout drops it.
    let waiter = stepping_waiter(10_500);
    waiter.set_compensation(i64::MIN);
    let outcome =
        tokio::time::timeout(Duration::from_millis(50), waiter.wait_seconds(1.0, Some(10_500))).await;
    assert!(outcome.is_err());

    let waiter = stepping_waiter(10_500);
    waiter.set_compensation(i64::MIN);
    let outcome =
        tokio::time::timeout(Duration::from_millis(50), waiter.wait_seconds(1e18, None)).await;
    assert!(outcome.is_err());
}
