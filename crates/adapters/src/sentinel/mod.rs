// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Externally observable marker of critical-section occupancy
//!
//! The holder creates the sentinel on entry and removes it on exit. Finding
//! it already present on entry means another peer is inside: mutual
//! exclusion has been broken.

mod file;

pub use file::FileSentinel;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSentinel, SentinelEvent};

use mx_core::Rank;
use thiserror::Error;

/// Errors from sentinel operations
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("sentinel {0} already present on entry")]
    AlreadyPresent(String),
    #[error("sentinel {0} vanished while held")]
    Missing(String),
    #[error("sentinel io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SentinelError {
    /// True when the error is evidence that mutual exclusion was broken
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            SentinelError::AlreadyPresent(_) | SentinelError::Missing(_)
        )
    }
}

/// Marker created on critical-section entry and removed on exit
pub trait Sentinel: Clone + Send + Sync + 'static {
    /// Create the marker; fails if it already exists
    fn acquire(&self, holder: Rank) -> Result<(), SentinelError>;

    /// Remove the marker; fails if it is gone
    fn release(&self, holder: Rank) -> Result<(), SentinelError>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}
