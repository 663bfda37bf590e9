// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration

use mx_core::ResourceName;
use std::time::Duration;

/// Per-peer coordinator settings
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Name carried in every request; peers must agree on it
    pub resource: ResourceName,
    /// Upper bound on any single blocking wait. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl CoordinatorConfig {
    pub fn new(resource: ResourceName) -> Self {
        Self {
            resource,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
