// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for request timestamps
//!
//! Whatever the source, a clock only has to produce real-valued timestamps
//! that never decrease on one peer. The `(timestamp, rank)` tie-break makes
//! the order total regardless of which clock the group uses.

use crate::request::Timestamp;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A source of request timestamps
pub trait Clock: Clone + Send + Sync {
    /// Timestamp for a request issued now.
    fn now(&self) -> Timestamp;

    /// Account for a timestamp seen on a peer's request.
    fn observe(&self, _seen: Timestamp) {}
}

/// Wall-clock seconds elapsed since an epoch shared by the whole group
#[derive(Clone, Debug)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// All peers of a group must be built from the same `epoch`.
    pub fn new(epoch: Instant) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.epoch.elapsed().as_secs_f64())
    }
}

/// Lamport counter: ticks on every read, merges observed timestamps
#[derive(Clone, Debug, Default)]
pub struct LamportClock {
    counter: Arc<Mutex<u64>>,
}

impl LamportClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter value without ticking.
    pub fn current(&self) -> u64 {
        *self.counter.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for LamportClock {
    fn now(&self) -> Timestamp {
        let mut counter = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        *counter += 1;
        Timestamp(*counter as f64)
    }

    fn observe(&self, seen: Timestamp) {
        let seen = seen.as_f64();
        if !seen.is_finite() || seen <= 0.0 {
            return;
        }
        let mut counter = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        *counter = (*counter).max(seen.ceil() as u64);
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<f64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::at(0.0)
    }

    /// A clock frozen at `seconds`
    pub fn at(seconds: f64) -> Self {
        Self {
            current: Arc::new(Mutex::new(seconds)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration.as_secs_f64();
    }

    /// Set the clock to a specific time
    pub fn set(&self, seconds: f64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = seconds;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Timestamp {
        Timestamp(*self.current.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
