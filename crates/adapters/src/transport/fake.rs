// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Envelope, Message, SendHandle, Source, Tag, Transport, TransportError};
use async_trait::async_trait;
use mx_core::Rank;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Send { dest: Rank, message: Message },
    WaitAll { count: usize },
    Recv { source: Source, tag: Tag },
    Barrier,
    Abort { reason: String },
}

/// Fake transport for testing
///
/// Incoming messages are scripted up front with [`FakeTransport::deliver`].
/// A receive with nothing matching fails instead of blocking, so a test that
/// forgets to script a message fails fast.
#[derive(Clone)]
pub struct FakeTransport {
    rank: Rank,
    size: usize,
    inbox: Arc<Mutex<VecDeque<Envelope>>>,
    calls: Arc<Mutex<Vec<TransportCall>>>,
    aborted: Arc<Mutex<Option<String>>>,
    next_seq: Arc<Mutex<u64>>,
}

impl FakeTransport {
    pub fn new(rank: Rank, size: usize) -> Self {
        Self {
            rank,
            size,
            inbox: Arc::default(),
            calls: Arc::default(),
            aborted: Arc::default(),
            next_seq: Arc::default(),
        }
    }

    /// Queue a message as if `source` had sent it to us
    pub fn deliver(&self, source: Rank, message: Message) {
        self.inbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Envelope { source, message });
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Messages sent so far, in order
    pub fn sent(&self) -> Vec<(Rank, Message)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Send { dest, message } => Some((dest, message)),
                _ => None,
            })
            .collect()
    }

    /// Destinations of sent messages with `tag`
    pub fn sent_to(&self, tag: Tag) -> Vec<Rank> {
        self.sent()
            .into_iter()
            .filter(|(_, m)| m.tag == tag)
            .map(|(dest, _)| dest)
            .collect()
    }

    pub fn abort_reason(&self) -> Option<String> {
        self.aborted.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: TransportCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn check_live(&self) -> Result<(), TransportError> {
        match self.abort_reason() {
            Some(reason) => Err(TransportError::Aborted(reason)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: Rank, message: Message) -> Result<SendHandle, TransportError> {
        self.check_live()?;
        self.record(TransportCall::Send { dest, message });

        let mut next = self.next_seq.lock().unwrap_or_else(|e| e.into_inner());
        *next += 1;
        Ok(SendHandle { dest, seq: *next })
    }

    async fn wait_all(&self, handles: Vec<SendHandle>) -> Result<(), TransportError> {
        self.record(TransportCall::WaitAll {
            count: handles.len(),
        });
        self.check_live()
    }

    async fn recv(&self, source: Source, tag: Tag) -> Result<Envelope, TransportError> {
        self.record(TransportCall::Recv { source, tag });
        self.check_live()?;

        let mut inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
        let pos = inbox
            .iter()
            .position(|e| e.message.tag == tag && source.matches(e.source))
            .ok_or(TransportError::NoMessage { from: source, tag })?;
        inbox
            .remove(pos)
            .ok_or(TransportError::NoMessage { from: source, tag })
    }

    async fn barrier(&self) -> Result<(), TransportError> {
        self.record(TransportCall::Barrier);
        self.check_live()
    }

    fn abort(&self, reason: &str) {
        self.record(TransportCall::Abort {
            reason: reason.to_string(),
        });
        let mut aborted = self.aborted.lock().unwrap_or_else(|e| e.into_inner());
        if aborted.is_none() {
            *aborted = Some(reason.to_string());
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
