// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_returns_increasing_time() {
    let clock = SystemClock::default();
    let t1 = clock.now();
    std::thread::sleep(Duration::from_millis(1));
    let t2 = clock.now();
    assert!(t2 > t1);
}

#[test]
fn system_clocks_sharing_an_epoch_are_comparable() {
    let epoch = Instant::now();
    let a = SystemClock::new(epoch);
    let b = SystemClock::new(epoch);
    let t1 = a.now();
    std::thread::sleep(Duration::from_millis(1));
    let t2 = b.now();
    assert!(t2 > t1);
    assert_eq!(a.epoch(), b.epoch());
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.now();
    clock.advance(Duration::from_secs(60));
    let t2 = clock.now();
    assert_eq!(t2.as_f64() - t1.as_f64(), 60.0);
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::at(5.0);
    let clock2 = clock1.clone();
    clock2.set(3.0);
    assert_eq!(clock1.now(), Timestamp(3.0));
}

#[test]
fn lamport_clock_ticks_on_every_read() {
    let clock = LamportClock::new();
    assert_eq!(clock.now(), Timestamp(1.0));
    assert_eq!(clock.now(), Timestamp(2.0));
    assert_eq!(clock.current(), 2);
}

#[test]
fn lamport_clock_merges_larger_observations() {
    let clock = LamportClock::new();
    clock.now();
    clock.observe(Timestamp(7.0));
    assert_eq!(clock.current(), 7);
    assert_eq!(clock.now(), Timestamp(8.0));
}

#[test]
fn lamport_clock_ignores_smaller_and_invalid_observations() {
    let clock = LamportClock::new();
    clock.observe(Timestamp(4.0));
    clock.observe(Timestamp(2.0));
    clock.observe(Timestamp(f64::NAN));
    clock.observe(Timestamp(-3.0));
    assert_eq!(clock.current(), 4);
}
