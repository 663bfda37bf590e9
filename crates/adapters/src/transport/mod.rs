// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-to-point transport between the peers of a group

mod channel;

pub use channel::ChannelTransport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, TransportCall};

use async_trait::async_trait;
use mx_core::Rank;
use thiserror::Error;

/// Errors from transport operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("group needs at least one peer")]
    EmptyGroup,
    #[error("rank {rank} is not a member of a group of {size}")]
    UnknownPeer { rank: Rank, size: usize },
    #[error("cannot send to own rank {0}")]
    SelfSend(Rank),
    #[error("group aborted: {0}")]
    Aborted(String),
    #[error("no {tag} message from {from} available")]
    NoMessage { from: Source, tag: Tag },
}

/// Message kinds, received selectively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Request,
    Grant,
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Request => write!(f, "request"),
            Tag::Grant => write!(f, "grant"),
        }
    }
}

/// Which sender a receive accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Rank(Rank),
    Any,
}

impl Source {
    pub fn matches(&self, rank: Rank) -> bool {
        match self {
            Source::Rank(r) => *r == rank,
            Source::Any => true,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Rank(r) => write!(f, "rank {}", r),
            Source::Any => write!(f, "any peer"),
        }
    }
}

/// A tagged payload scoped to one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tag: Tag,
    pub round: u64,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(tag: Tag, round: u64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            round,
            payload: payload.into(),
        }
    }
}

/// A received message and who sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub source: Rank,
    pub message: Message,
}

/// Handle to a non-blocking send, redeemed by [`Transport::wait_all`]
#[derive(Debug)]
#[must_use = "sends must be waited on before their round ends"]
pub struct SendHandle {
    pub dest: Rank,
    pub seq: u64,
}

/// Reliable, per-sender ordered messaging between the peers of a group
///
/// Messages from one sender to one receiver arrive in the order they were
/// sent. Nothing is guaranteed about ordering across senders.
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// Our rank within the group
    fn rank(&self) -> Rank;

    /// Number of peers in the group
    fn size(&self) -> usize;

    /// Start sending `message` to `dest` without blocking
    fn send(&self, dest: Rank, message: Message) -> Result<SendHandle, TransportError>;

    /// Block until every send in `handles` has completed
    async fn wait_all(&self, handles: Vec<SendHandle>) -> Result<(), TransportError>;

    /// Block until a message with `tag` from `source` arrives
    async fn recv(&self, source: Source, tag: Tag) -> Result<Envelope, TransportError>;

    /// Block until every peer of the group has called `barrier`
    async fn barrier(&self) -> Result<(), TransportError>;

    /// Abort the whole group: every pending and future wait on every peer fails
    fn abort(&self, reason: &str);
}
