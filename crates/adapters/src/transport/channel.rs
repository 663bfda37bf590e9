// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process transport: a fully connected mesh of mailboxes
//!
//! Each peer owns one mailbox. A send appends to the receiver's mailbox and
//! completes immediately; a receive takes the oldest message matching its
//! source and tag, which keeps delivery FIFO per sender.

use super::{Envelope, Message, SendHandle, Source, Tag, Transport, TransportError};
use async_trait::async_trait;
use mx_core::Rank;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Barrier, Notify};

#[derive(Default)]
struct Mailbox {
    queue: Mutex<VecDeque<Envelope>>,
    // Single consumer, so notify_one's stored permit covers a push that
    // lands between checking the queue and waiting
    notify: Notify,
}

impl Mailbox {
    fn push(&self, envelope: Envelope) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(envelope);
        self.notify.notify_one();
    }

    fn take(&self, source: Source, tag: Tag) -> Option<Envelope> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        let pos = queue
            .iter()
            .position(|e| e.message.tag == tag && source.matches(e.source))?;
        queue.remove(pos)
    }

    fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct Group {
    mailboxes: Vec<Mailbox>,
    barrier: Barrier,
    abort: watch::Sender<Option<String>>,
}

/// One peer's endpoint into an in-process group
#[derive(Clone)]
pub struct ChannelTransport {
    rank: Rank,
    group: Arc<Group>,
    next_seq: Arc<AtomicU64>,
}

impl ChannelTransport {
    /// Build a group of `size` connected endpoints, indexed by rank
    pub fn group(size: usize) -> Result<Vec<Self>, TransportError> {
        if size == 0 {
            return Err(TransportError::EmptyGroup);
        }

        let (abort, _) = watch::channel(None);
        let group = Arc::new(Group {
            mailboxes: (0..size).map(|_| Mailbox::default()).collect(),
            barrier: Barrier::new(size),
            abort,
        });

        Ok((0..size)
            .map(|rank| Self {
                rank: Rank(rank as u32),
                group: Arc::clone(&group),
                next_seq: Arc::new(AtomicU64::new(0)),
            })
            .collect())
    }

    /// Reason the group was aborted, if it was
    pub fn abort_reason(&self) -> Option<String> {
        self.group.abort.borrow().clone()
    }

    /// Messages waiting in our mailbox
    pub fn pending(&self) -> usize {
        self.mailbox().len()
    }

    fn mailbox(&self) -> &Mailbox {
        &self.group.mailboxes[self.rank.index()]
    }

    fn check_live(&self) -> Result<(), TransportError> {
        match self.abort_reason() {
            Some(reason) => Err(TransportError::Aborted(reason)),
            None => Ok(()),
        }
    }

    /// Resolves once the group is aborted
    async fn aborted(&self) -> TransportError {
        let mut rx = self.group.abort.subscribe();
        let reason = match rx.wait_for(|r| r.is_some()).await {
            Ok(reason) => reason.clone().unwrap_or_default(),
            Err(_) => "group dropped".to_string(),
        };
        TransportError::Aborted(reason)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.group.mailboxes.len()
    }

    fn send(&self, dest: Rank, message: Message) -> Result<SendHandle, TransportError> {
        self.check_live()?;
        if dest == self.rank {
            return Err(TransportError::SelfSend(dest));
        }
        let Some(mailbox) = self.group.mailboxes.get(dest.index()) else {
            return Err(TransportError::UnknownPeer {
                rank: dest,
                size: self.size(),
            });
        };

        mailbox.push(Envelope {
            source: self.rank,
            message,
        });

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        Ok(SendHandle { dest, seq })
    }

    async fn wait_all(&self, _handles: Vec<SendHandle>) -> Result<(), TransportError> {
        // Delivery into the mailbox completes the send
        self.check_live()
    }

    async fn recv(&self, source: Source, tag: Tag) -> Result<Envelope, TransportError> {
        if let Source::Rank(rank) = source {
            if rank.index() >= self.size() {
                return Err(TransportError::UnknownPeer {
                    rank,
                    size: self.size(),
                });
            }
        }

        loop {
            self.check_live()?;
            if let Some(envelope) = self.mailbox().take(source, tag) {
                return Ok(envelope);
            }

            tokio::select! {
                _ = self.mailbox().notify.notified() => {}
                err = self.aborted() => return Err(err),
            }
        }
    }

    async fn barrier(&self) -> Result<(), TransportError> {
        self.check_live()?;
        tokio::select! {
            _ = self.group.barrier.wait() => self.check_live(),
            err = self.aborted() => Err(err),
        }
    }

    fn abort(&self, reason: &str) {
        // First reason wins
        self.group.abort.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason.to_string());
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
