// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusion coordinator
//!
//! Drives one peer's [`Round`] state machine over a [`Transport`]: the
//! round decides, the coordinator performs the sends, receives and
//! barriers it asks for. Any error aborts the whole group.

use crate::{CoordinatorConfig, CoordinatorError};
use mx_adapters::{Envelope, Message, SendHandle, Sentinel, Source, Tag, Transport, TransportError};
use mx_core::{
    decode_grant, decode_request, encode_request, Clock, Effect, Rank, Round, RoundEvent,
    GRANT_PAYLOAD,
};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Handed to the critical-section body on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub rank: Rank,
    pub round: u64,
}

/// Summary of one completed round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundReport {
    pub rank: u32,
    pub round: u64,
    pub timestamp: f64,
    /// Peers granted as soon as every request was in
    pub granted: Vec<u32>,
    /// Peers held back until we left the section
    pub deferred: Vec<u32>,
    /// From issuing our request to entering
    pub waited_ms: u64,
    /// Time spent inside the section
    pub held_ms: u64,
}

#[derive(Debug, Default)]
struct Timing {
    started: Option<Instant>,
    entered: Option<Instant>,
    waited: Duration,
    held: Duration,
}

/// One peer's side of the mutual exclusion protocol
pub struct Coordinator<T, C, S> {
    transport: T,
    clock: C,
    sentinel: S,
    config: CoordinatorConfig,
    round: Round,
    /// Sends issued but not yet waited on
    pending: Vec<SendHandle>,
    timing: Timing,
}

impl<T, C, S> Coordinator<T, C, S>
where
    T: Transport,
    C: Clock,
    S: Sentinel,
{
    /// Create a coordinator for the transport's rank, ready for round 1
    pub fn new(
        transport: T,
        clock: C,
        sentinel: S,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError> {
        let round = Round::new(
            1,
            transport.rank(),
            transport.size(),
            config.resource.clone(),
        )?;
        Ok(Self {
            transport,
            clock,
            sentinel,
            config,
            round,
            pending: Vec::new(),
            timing: Timing::default(),
        })
    }

    pub fn rank(&self) -> Rank {
        self.transport.rank()
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Stamp our request and send it to every other peer without blocking
    pub async fn begin_round(&mut self) -> Result<(), CoordinatorError> {
        let result = self.begin_round_inner().await;
        self.abort_on_error(result)
    }

    /// Receive every peer's request, then meet the group at the barrier
    pub async fn collect_requests(&mut self) -> Result<(), CoordinatorError> {
        let result = self.collect_requests_inner().await;
        self.abort_on_error(result)
    }

    /// Grant every request that precedes ours; defer the rest
    pub async fn decide_and_send_immediate_grants(&mut self) -> Result<(), CoordinatorError> {
        let result = self.decide_inner().await;
        self.abort_on_error(result)
    }

    /// Block until every other peer has granted us
    pub async fn await_all_grants(&mut self) -> Result<(), CoordinatorError> {
        let result = self.await_all_grants_inner().await;
        self.abort_on_error(result)
    }

    /// Create the sentinel. Finding it present means exclusion is broken.
    pub fn enter_section(&mut self) -> Result<(), CoordinatorError> {
        let result = self.enter_section_inner();
        self.abort_on_error(result)
    }

    /// Remove the sentinel
    pub fn exit_section(&mut self) -> Result<(), CoordinatorError> {
        let result = self.exit_section_inner();
        self.abort_on_error(result)
    }

    /// Send the grants we deferred and wait for them to complete
    pub async fn release(&mut self) -> Result<(), CoordinatorError> {
        let result = self.release_inner().await;
        self.abort_on_error(result)
    }

    /// Run a full round, invoking `body` exactly once inside the section
    pub async fn run_one_round<F, Fut, O>(
        &mut self,
        body: F,
    ) -> Result<(O, RoundReport), CoordinatorError>
    where
        F: FnOnce(Turn) -> Fut,
        Fut: Future<Output = O>,
    {
        let span = tracing::info_span!("round", rank = %self.rank(), round = self.upcoming_round());
        self.run_one_round_inner(body).instrument(span).await
    }

    /// Run `count` rounds back to back
    pub async fn run_rounds<F, Fut, O>(
        &mut self,
        count: u64,
        mut body: F,
    ) -> Result<Vec<(O, RoundReport)>, CoordinatorError>
    where
        F: FnMut(Turn) -> Fut,
        Fut: Future<Output = O>,
    {
        let mut results = Vec::new();
        for _ in 0..count {
            results.push(self.run_one_round(&mut body).await?);
        }
        Ok(results)
    }

    async fn run_one_round_inner<F, Fut, O>(
        &mut self,
        body: F,
    ) -> Result<(O, RoundReport), CoordinatorError>
    where
        F: FnOnce(Turn) -> Fut,
        Fut: Future<Output = O>,
    {
        self.begin_round().await?;
        self.collect_requests().await?;
        self.decide_and_send_immediate_grants().await?;
        self.await_all_grants().await?;
        self.enter_section()?;

        let output = body(Turn {
            rank: self.rank(),
            round: self.round.number(),
        })
        .await;

        self.exit_section()?;
        self.release().await?;
        Ok((output, self.report()))
    }

    async fn begin_round_inner(&mut self) -> Result<(), CoordinatorError> {
        if self.round.is_done() {
            self.round = Round::new(
                self.round.number() + 1,
                self.rank(),
                self.round.size(),
                self.config.resource.clone(),
            )?;
        }

        let timestamp = self.clock.now();
        let effects = self.apply(RoundEvent::Begin { timestamp })?;
        self.timing = Timing {
            started: Some(Instant::now()),
            ..Timing::default()
        };
        tracing::debug!(%timestamp, "request issued");
        self.execute(effects).await
    }

    async fn collect_requests_inner(&mut self) -> Result<(), CoordinatorError> {
        for peer in self.rank().others(self.round.size()) {
            let envelope = self
                .bounded(
                    "request",
                    self.transport.recv(Source::Rank(peer), Tag::Request),
                )
                .await?;
            self.check_round(&envelope)?;

            let request = decode_request(&envelope.message.payload)?;
            if request.sender != envelope.source {
                return Err(CoordinatorError::ForgedSender {
                    from: envelope.source,
                    claimed: request.sender,
                });
            }
            tracing::debug!(from = %peer, timestamp = %request.timestamp, "request received");

            self.clock.observe(request.timestamp);
            self.apply(RoundEvent::RequestReceived(request))?;
        }

        let effects = self.apply(RoundEvent::RequestsCollected)?;
        self.execute(effects).await
    }

    async fn decide_inner(&mut self) -> Result<(), CoordinatorError> {
        let effects = self.apply(RoundEvent::Decide)?;
        tracing::debug!(
            granted = ?self.round.immediate(),
            deferred = ?self.round.deferred(),
            "decided"
        );
        self.execute(effects).await
    }

    async fn await_all_grants_inner(&mut self) -> Result<(), CoordinatorError> {
        while !self.round.is_cleared() {
            let envelope = self
                .bounded("grant", self.transport.recv(Source::Any, Tag::Grant))
                .await?;
            self.check_round(&envelope)?;
            decode_grant(&envelope.message.payload)?;
            self.apply(RoundEvent::GrantReceived {
                from: envelope.source,
            })?;
            tracing::debug!(
                from = %envelope.source,
                received = self.round.grants_received(),
                expected = self.round.grants_expected(),
                "grant received"
            );
        }
        Ok(())
    }

    fn enter_section_inner(&mut self) -> Result<(), CoordinatorError> {
        self.apply(RoundEvent::Enter)?;
        let rank = self.rank();
        self.sentinel
            .acquire(rank)
            .map_err(|e| CoordinatorError::from_sentinel(rank, e))?;

        let now = Instant::now();
        self.timing.waited = self
            .timing
            .started
            .map(|started| now.duration_since(started))
            .unwrap_or_default();
        self.timing.entered = Some(now);
        tracing::info!(waited_ms = self.timing.waited.as_millis() as u64, "entered critical section");
        Ok(())
    }

    fn exit_section_inner(&mut self) -> Result<(), CoordinatorError> {
        self.apply(RoundEvent::Exit)?;
        let rank = self.rank();
        self.sentinel
            .release(rank)
            .map_err(|e| CoordinatorError::from_sentinel(rank, e))?;

        self.timing.held = self
            .timing
            .entered
            .map(|entered| entered.elapsed())
            .unwrap_or_default();
        tracing::info!(held_ms = self.timing.held.as_millis() as u64, "left critical section");
        Ok(())
    }

    async fn release_inner(&mut self) -> Result<(), CoordinatorError> {
        let effects = self.apply(RoundEvent::Release)?;
        self.execute(effects).await?;
        tracing::debug!(released = ?self.round.deferred(), "round done");
        Ok(())
    }

    /// Feed one event to the round and adopt the result
    fn apply(&mut self, event: RoundEvent) -> Result<Vec<Effect>, CoordinatorError> {
        let before = self.round.phase();
        let (next, effects) = self.round.transition(event)?;
        if next.phase() != before {
            tracing::debug!(from = %before, to = %next.phase(), "phase");
        }
        self.round = next;
        Ok(effects)
    }

    async fn execute(&mut self, effects: Vec<Effect>) -> Result<(), CoordinatorError> {
        let number = self.round.number();
        for effect in effects {
            tracing::trace!(effect = effect.name(), "executing");
            match effect {
                Effect::SendRequest { to, request } => {
                    let payload = encode_request(&request)?;
                    let handle = self
                        .transport
                        .send(to, Message::new(Tag::Request, number, payload.to_vec()))?;
                    self.pending.push(handle);
                }
                Effect::SendGrant { to } => {
                    let handle = self
                        .transport
                        .send(to, Message::new(Tag::Grant, number, GRANT_PAYLOAD.to_vec()))?;
                    self.pending.push(handle);
                }
                Effect::WaitSends => {
                    let handles = std::mem::take(&mut self.pending);
                    self.bounded("send completion", self.transport.wait_all(handles))
                        .await?;
                }
                Effect::Barrier => {
                    self.bounded("barrier", self.transport.barrier()).await?;
                }
            }
        }
        Ok(())
    }

    /// Await a transport wait, bounded by the configured timeout
    async fn bounded<X>(
        &self,
        operation: &'static str,
        wait: impl Future<Output = Result<X, TransportError>>,
    ) -> Result<X, CoordinatorError> {
        let Some(after) = self.config.timeout else {
            return Ok(wait.await?);
        };
        match tokio::time::timeout(after, wait).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CoordinatorError::Timeout {
                phase: self.round.phase(),
                operation,
                after,
            }),
        }
    }

    fn check_round(&self, envelope: &Envelope) -> Result<(), CoordinatorError> {
        let expected = self.round.number();
        if envelope.message.round != expected {
            return Err(CoordinatorError::StaleMessage {
                from: envelope.source,
                tag: envelope.message.tag,
                expected,
                got: envelope.message.round,
            });
        }
        Ok(())
    }

    fn abort_on_error<X>(&self, result: Result<X, CoordinatorError>) -> Result<X, CoordinatorError> {
        if let Err(e) = &result {
            if !e.is_aborted() {
                tracing::error!(error = %e, "round failed");
                self.transport.abort(&e.to_string());
            }
        }
        result
    }

    fn upcoming_round(&self) -> u64 {
        if self.round.is_done() {
            self.round.number() + 1
        } else {
            self.round.number()
        }
    }

    fn report(&self) -> RoundReport {
        RoundReport {
            rank: self.rank().0,
            round: self.round.number(),
            timestamp: self
                .round
                .own_request()
                .map(|r| r.timestamp.as_f64())
                .unwrap_or_default(),
            granted: self.round.immediate().iter().map(|r| r.0).collect(),
            deferred: self.round.deferred().iter().map(|r| r.0).collect(),
            waited_ms: self.timing.waited.as_millis() as u64,
            held_ms: self.timing.held.as_millis() as u64,
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
