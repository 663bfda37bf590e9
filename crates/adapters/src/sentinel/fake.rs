// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sentinel for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Sentinel, SentinelError};
use mx_core::Rank;
use std::sync::{Arc, Mutex};

/// Recorded sentinel activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelEvent {
    Acquired(Rank),
    Released(Rank),
    /// Acquire found the marker present
    Rejected(Rank),
}

#[derive(Default)]
struct State {
    holder: Option<Rank>,
    history: Vec<SentinelEvent>,
}

/// In-memory sentinel shared by every clone
#[derive(Clone, Default)]
pub struct FakeSentinel {
    state: Arc<Mutex<State>>,
}

impl FakeSentinel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sentinel that is already held, as if left behind by `holder`
    pub fn held_by(holder: Rank) -> Self {
        let sentinel = Self::new();
        sentinel.state.lock().unwrap_or_else(|e| e.into_inner()).holder = Some(holder);
        sentinel
    }

    pub fn holder(&self) -> Option<Rank> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).holder
    }

    /// Everything that happened, in order
    pub fn history(&self) -> Vec<SentinelEvent> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .history
            .clone()
    }

    /// Ranks in the order they acquired the sentinel
    pub fn entry_order(&self) -> Vec<Rank> {
        self.history()
            .into_iter()
            .filter_map(|e| match e {
                SentinelEvent::Acquired(rank) => Some(rank),
                _ => None,
            })
            .collect()
    }
}

impl Sentinel for FakeSentinel {
    fn acquire(&self, holder: Rank) -> Result<(), SentinelError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.holder.is_some() {
            state.history.push(SentinelEvent::Rejected(holder));
            return Err(SentinelError::AlreadyPresent(self.describe()));
        }
        state.holder = Some(holder);
        state.history.push(SentinelEvent::Acquired(holder));
        Ok(())
    }

    fn release(&self, holder: Rank) -> Result<(), SentinelError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.holder.take().is_none() {
            return Err(SentinelError::Missing(self.describe()));
        }
        state.history.push(SentinelEvent::Released(holder));
        Ok(())
    }

    fn describe(&self) -> String {
        "fake".to_string()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
