// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the outside world: peer messaging and the occupancy sentinel

pub mod sentinel;
pub mod traced;
pub mod transport;

pub use sentinel::{FileSentinel, Sentinel, SentinelError};
pub use traced::{TracedSentinel, TracedTransport};
pub use transport::{
    ChannelTransport, Envelope, Message, SendHandle, Source, Tag, Transport, TransportError,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use sentinel::{FakeSentinel, SentinelEvent};
#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeTransport, TransportCall};
