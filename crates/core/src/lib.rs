// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mx-core: data model and pure state machine for distributed mutual exclusion
//!
//! This crate provides:
//! - Requests, ranks, timestamps and the `(timestamp, rank)` priority order
//! - Clock sources for request timestamps (wall clock, Lamport, fake)
//! - The fixed-layout wire encoding of requests and grants
//! - The per-round state machine and the effects it asks its driver to run

pub mod clock;
pub mod effect;
pub mod request;
pub mod round;
pub mod wire;

pub use clock::{Clock, FakeClock, LamportClock, SystemClock};
pub use effect::Effect;
pub use request::{
    admission_order, NameError, PriorityKey, Rank, Request, ResourceName, Timestamp,
    MAX_RESOURCE_NAME,
};
pub use round::{Round, RoundError, RoundEvent, RoundPhase};
pub use wire::{decode_grant, decode_request, encode_request, WireError, GRANT_PAYLOAD, REQUEST_LEN};
