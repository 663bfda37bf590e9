// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests and the priority order between them
//!
//! Every peer derives the same total order over requests from the same two
//! fields, `(timestamp, rank)`, so no peer ever needs to see the whole set of
//! requests at once to agree with the others on who goes first.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Maximum length in bytes of a resource name.
pub const MAX_RESOURCE_NAME: usize = 80;

/// Identity of a peer within the group, in `[0, N)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank(pub u32);

impl Rank {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All other ranks of a group of `size` peers, starting after `self`
    /// and wrapping around.
    pub fn others(self, size: usize) -> impl Iterator<Item = Rank> {
        let own = self.index();
        (1..size).map(move |offset| Rank(((own + offset) % size) as u32))
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Rank {
    fn from(n: u32) -> Self {
        Rank(n)
    }
}

/// Logical time at which a request was issued.
///
/// Compared with IEEE-754 total ordering, so the comparison is total even
/// for NaN and signed zeros and every peer orders the same bits the same way.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for Timestamp {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl From<f64> for Timestamp {
    fn from(t: f64) -> Self {
        Timestamp(t)
    }
}

/// Errors constructing a resource name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("resource name is {len} bytes, limit is {MAX_RESOURCE_NAME}")]
    TooLong { len: usize },
    #[error("resource name must not contain NUL bytes")]
    ContainsNul,
}

/// Name of the protected resource, at most [`MAX_RESOURCE_NAME`] bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        if name.len() > MAX_RESOURCE_NAME {
            return Err(NameError::TooLong { len: name.len() });
        }
        if name.contains('\0') {
            return Err(NameError::ContainsNul);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResourceName {
    fn default() -> Self {
        Self("critical".to_string())
    }
}

impl TryFrom<String> for ResourceName {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.0
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A peer's bid for the resource in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub timestamp: Timestamp,
    pub sender: Rank,
    pub resource: ResourceName,
}

impl Request {
    pub fn new(timestamp: impl Into<Timestamp>, sender: Rank, resource: ResourceName) -> Self {
        Self {
            timestamp: timestamp.into(),
            sender,
            resource,
        }
    }

    pub fn key(&self) -> PriorityKey {
        PriorityKey::new(self.timestamp, self.sender)
    }

    /// True if this request must be served before `other`.
    pub fn precedes(&self, other: &Request) -> bool {
        self.key() < other.key()
    }
}

/// `(timestamp, rank)`, ordered lexicographically.
///
/// The derived ordering compares `timestamp` first and falls back to `rank`,
/// so equal timestamps are won by the smaller rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriorityKey {
    pub timestamp: Timestamp,
    pub rank: Rank,
}

impl PriorityKey {
    pub fn new(timestamp: impl Into<Timestamp>, rank: Rank) -> Self {
        Self {
            timestamp: timestamp.into(),
            rank,
        }
    }
}

impl std::fmt::Display for PriorityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(t={}, rank={})", self.timestamp, self.rank)
    }
}

/// Sort keys into the order in which their owners will enter the section.
pub fn admission_order(keys: impl IntoIterator<Item = PriorityKey>) -> Vec<PriorityKey> {
    let mut keys: Vec<_> = keys.into_iter().collect();
    keys.sort();
    keys
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
