// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::sentinel::{Sentinel, SentinelError};
use crate::transport::{Envelope, Message, SendHandle, Source, Tag, Transport, TransportError};
use async_trait::async_trait;
use mx_core::Rank;
use tracing::Instrument;

/// Wrapper that adds tracing to any Transport
#[derive(Clone)]
pub struct TracedTransport<T> {
    inner: T,
}

impl<T> TracedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for TracedTransport<T> {
    fn rank(&self) -> Rank {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn send(&self, dest: Rank, message: Message) -> Result<SendHandle, TransportError> {
        let tag = message.tag;
        let round = message.round;
        let len = message.payload.len();
        let result = self.inner.send(dest, message);

        match &result {
            Ok(handle) => tracing::debug!(
                rank = %self.inner.rank(),
                %dest,
                %tag,
                round,
                len,
                seq = handle.seq,
                "sent"
            ),
            Err(e) => tracing::error!(rank = %self.inner.rank(), %dest, %tag, error = %e, "send failed"),
        }

        result
    }

    async fn wait_all(&self, handles: Vec<SendHandle>) -> Result<(), TransportError> {
        let count = handles.len();
        let result = self.inner.wait_all(handles).await;
        match &result {
            Ok(()) => tracing::trace!(rank = %self.inner.rank(), count, "sends completed"),
            Err(e) => tracing::error!(rank = %self.inner.rank(), count, error = %e, "wait failed"),
        }
        result
    }

    async fn recv(&self, source: Source, tag: Tag) -> Result<Envelope, TransportError> {
        let span = tracing::debug_span!("transport.recv", rank = %self.inner.rank(), %source, %tag);

        let start = std::time::Instant::now();
        let result = self.inner.recv(source, tag).instrument(span.clone()).await;
        let elapsed = start.elapsed();

        let _guard = span.enter();
        match &result {
            Ok(envelope) => tracing::debug!(
                from = %envelope.source,
                round = envelope.message.round,
                elapsed_ms = elapsed.as_millis() as u64,
                "received"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "recv failed"
            ),
        }

        result
    }

    async fn barrier(&self) -> Result<(), TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.barrier().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => tracing::debug!(rank = %self.inner.rank(), elapsed_ms, "barrier passed"),
            Err(e) => tracing::error!(rank = %self.inner.rank(), elapsed_ms, error = %e, "barrier failed"),
        }

        result
    }

    fn abort(&self, reason: &str) {
        tracing::error!(rank = %self.inner.rank(), reason, "aborting group");
        self.inner.abort(reason);
    }
}

/// Wrapper that adds tracing to any Sentinel
#[derive(Clone)]
pub struct TracedSentinel<S> {
    inner: S,
}

impl<S> TracedSentinel<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Sentinel> Sentinel for TracedSentinel<S> {
    fn acquire(&self, holder: Rank) -> Result<(), SentinelError> {
        let result = self.inner.acquire(holder);
        match &result {
            Ok(()) => tracing::info!(%holder, sentinel = %self.inner.describe(), "sentinel created"),
            Err(e) if e.is_violation() => {
                tracing::error!(%holder, error = %e, "mutual exclusion violated")
            }
            Err(e) => tracing::error!(%holder, error = %e, "sentinel create failed"),
        }
        result
    }

    fn release(&self, holder: Rank) -> Result<(), SentinelError> {
        let result = self.inner.release(holder);
        match &result {
            Ok(()) => tracing::info!(%holder, sentinel = %self.inner.describe(), "sentinel removed"),
            Err(e) => tracing::error!(%holder, error = %e, "sentinel remove failed"),
        }
        result
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
