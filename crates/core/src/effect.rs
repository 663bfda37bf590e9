// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects the round state machine asks its driver to perform

use crate::request::{Rank, Request};

/// Side effects requested by a [`Round`](crate::round::Round) transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Non-blocking send of our request to a peer
    SendRequest { to: Rank, request: Request },
    /// Non-blocking send of a grant token to a peer
    SendGrant { to: Rank },
    /// Block until every send issued so far has completed
    WaitSends,
    /// Block until every peer of the group reaches the barrier
    Barrier,
}

impl Effect {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Effect::SendRequest { .. } => "send_request",
            Effect::SendGrant { .. } => "send_grant",
            Effect::WaitSends => "wait_sends",
            Effect::Barrier => "barrier",
        }
    }
}
