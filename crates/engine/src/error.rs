// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordinator

use mx_adapters::{SentinelError, Tag, TransportError};
use mx_core::{Rank, RoundError, RoundPhase, WireError};
use std::time::Duration;
use thiserror::Error;

/// Errors that end a round. None of them are retried.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("protocol error: {0}")]
    Round(#[from] RoundError),
    #[error("malformed message: {0}")]
    Wire(#[from] WireError),
    #[error("{tag} from rank {from} belongs to round {got}, expected round {expected}")]
    StaleMessage {
        from: Rank,
        tag: Tag,
        expected: u64,
        got: u64,
    },
    #[error("request delivered by rank {from} claims to come from rank {claimed}")]
    ForgedSender { from: Rank, claimed: Rank },
    #[error("mutual exclusion violated at rank {rank}: {source}")]
    InvariantViolation { rank: Rank, source: SentinelError },
    #[error("sentinel error: {0}")]
    Sentinel(#[source] SentinelError),
    #[error("timed out after {after:?} waiting on {operation} in phase {phase}")]
    Timeout {
        phase: RoundPhase,
        operation: &'static str,
        after: Duration,
    },
}

impl CoordinatorError {
    /// True when this peer failed only because another peer aborted the group
    pub fn is_aborted(&self) -> bool {
        matches!(self, CoordinatorError::Transport(TransportError::Aborted(_)))
    }

    /// True for errors that prove two peers were inside the section at once
    pub fn is_violation(&self) -> bool {
        matches!(self, CoordinatorError::InvariantViolation { .. })
    }

    pub(crate) fn from_sentinel(rank: Rank, error: SentinelError) -> Self {
        if error.is_violation() {
            CoordinatorError::InvariantViolation {
                rank,
                source: error,
            }
        } else {
            CoordinatorError::Sentinel(error)
        }
    }
}
