// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Mutual exclusion engine: drives rounds over a transport

mod config;
mod coordinator;
mod error;
mod group;
mod section;

pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, RoundReport, Turn};
pub use error::CoordinatorError;
pub use group::{run_local_group, GroupConfig, GroupError};
pub use section::HoldSection;
