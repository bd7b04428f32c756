use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use morse_hardware::util::poll_until;
use morse_traits::{MonotonicClock, TestClock};
use rstest::rstest;

#[test]
fn poll_until_success_path() {
    let ready = Arc::new(AtomicBool::new(false));
    let ready_bg = ready.clone();
    // Flip after a short delay
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        ready_bg.store(true, Ordering::Relaxed);
    });

    let res = poll_until(
        &MonotonicClock::new(),
        || Ok(ready.load(Ordering::Relaxed)),
        Duration::from_millis(500),
        Duration::from_millis(1),
    );
    assert!(matches!(res, Ok(true)), "expected success, got {res:?}");
}

#[rstest]
#[case(40, 5, 40)]
#[case(12, 5, 15)]
#[case(3, 0, 3)]
fn poll_until_window_expires(#[case] window_ms: u64, #[case] poll_ms: u64, #[case] slept_ms: u64) {
    let clock = TestClock::new();
    let res = poll_until(
        &clock,
        || Ok(false),
        Duration::from_millis(window_ms),
        Duration::from_millis(poll_ms),
    );
    assert!(matches!(res, Ok(false)));
    assert_eq!(clock.offset(), Duration::from_millis(slept_ms));
}

#[test]
fn poll_until_propagates_read_errors() {
    let clock = TestClock::new();
    let res = poll_until(
        &clock,
        || Err("sensor gone".into()),
        Duration::from_millis(40),
        Duration::from_millis(5),
    );
    let err = res.expect_err("error should propagate");
    assert!(err.to_string().contains("sensor gone"));
}
