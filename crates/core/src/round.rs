// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Round state machine
//!
//! One `Round` is one peer's bid for the resource:
//!
//! ```text
//! Idle → RequestSent → Collecting → Deciding → AwaitingGrants
//!      → InSection → Releasing → Done
//! ```
//!
//! Transitions are pure: they return the next round and the effects the
//! driver must perform. Events that make no sense in the current phase are
//! errors, never silently ignored.

use crate::effect::Effect;
use crate::request::{Rank, Request, ResourceName, Timestamp};
use thiserror::Error;

/// Where a round is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    RequestSent,
    Collecting,
    Deciding,
    AwaitingGrants,
    InSection,
    Releasing,
    Done,
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoundPhase::Idle => "idle",
            RoundPhase::RequestSent => "request_sent",
            RoundPhase::Collecting => "collecting",
            RoundPhase::Deciding => "deciding",
            RoundPhase::AwaitingGrants => "awaiting_grants",
            RoundPhase::InSection => "in_section",
            RoundPhase::Releasing => "releasing",
            RoundPhase::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Inputs to the round state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// Issue our request, stamped with `timestamp`
    Begin { timestamp: Timestamp },
    /// A peer's request arrived
    RequestReceived(Request),
    /// Every peer's request is in
    RequestsCollected,
    /// Sends completed and the barrier passed; compute grants
    Decide,
    /// A grant token arrived
    GrantReceived { from: Rank },
    /// Entering the critical section
    Enter,
    /// Leaving the critical section
    Exit,
    /// Hand out deferred grants
    Release,
}

impl RoundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoundEvent::Begin { .. } => "begin",
            RoundEvent::RequestReceived(_) => "request_received",
            RoundEvent::RequestsCollected => "requests_collected",
            RoundEvent::Decide => "decide",
            RoundEvent::GrantReceived { .. } => "grant_received",
            RoundEvent::Enter => "enter",
            RoundEvent::Exit => "exit",
            RoundEvent::Release => "release",
        }
    }
}

/// Protocol violations detected by the round state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("group must have at least one peer")]
    EmptyGroup,
    #[error("rank {rank} is outside a group of {size}")]
    RankOutOfRange { rank: Rank, size: usize },
    #[error("event {event} not allowed in phase {phase}")]
    UnexpectedEvent {
        phase: RoundPhase,
        event: &'static str,
    },
    #[error("received a message claiming to come from ourselves (rank {0})")]
    FromSelf(Rank),
    #[error("second request from rank {0} in one round")]
    DuplicateRequest(Rank),
    #[error("request from rank {from} names resource {got:?}, expected {expected:?}")]
    ResourceMismatch {
        from: Rank,
        expected: String,
        got: String,
    },
    #[error("still missing requests from ranks {0:?}")]
    MissingRequests(Vec<Rank>),
    #[error("second grant from rank {0} in one round")]
    DuplicateGrant(Rank),
    #[error("entered with {received} of {expected} grants")]
    MissingGrants { received: usize, expected: usize },
}

/// One peer's per-round protocol state
#[derive(Debug, Clone)]
pub struct Round {
    number: u64,
    rank: Rank,
    size: usize,
    resource: ResourceName,
    phase: RoundPhase,
    own: Option<Request>,
    /// Requests indexed by sender rank; our own slot stays empty
    requests: Vec<Option<Request>>,
    /// Peers we granted during the decision phase
    immediate: Vec<Rank>,
    /// Peers that wait for us to leave the section
    deferred: Vec<Rank>,
    /// Grants received, indexed by sender rank
    grants: Vec<bool>,
}

impl Round {
    pub fn new(
        number: u64,
        rank: Rank,
        size: usize,
        resource: ResourceName,
    ) -> Result<Self, RoundError> {
        if size == 0 {
            return Err(RoundError::EmptyGroup);
        }
        if rank.index() >= size {
            return Err(RoundError::RankOutOfRange { rank, size });
        }

        Ok(Self {
            number,
            rank,
            size,
            resource,
            phase: RoundPhase::Idle,
            own: None,
            requests: vec![None; size],
            immediate: Vec::new(),
            deferred: Vec::new(),
            grants: vec![false; size],
        })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn own_request(&self) -> Option<&Request> {
        self.own.as_ref()
    }

    pub fn request_from(&self, rank: Rank) -> Option<&Request> {
        self.requests.get(rank.index()).and_then(|r| r.as_ref())
    }

    pub fn immediate(&self) -> &[Rank] {
        &self.immediate
    }

    pub fn deferred(&self) -> &[Rank] {
        &self.deferred
    }

    pub fn grants_received(&self) -> usize {
        self.grants.iter().filter(|g| **g).count()
    }

    pub fn grants_expected(&self) -> usize {
        self.size - 1
    }

    /// All N−1 grants are in; entering is safe
    pub fn is_cleared(&self) -> bool {
        self.grants_received() == self.grants_expected()
    }

    pub fn is_done(&self) -> bool {
        self.phase == RoundPhase::Done
    }

    /// Ranks whose request has not arrived yet
    pub fn missing_requests(&self) -> Vec<Rank> {
        self.rank
            .others(self.size)
            .filter(|r| self.requests[r.index()].is_none())
            .collect()
    }

    /// Pure transition function - returns new round and effects
    pub fn transition(&self, event: RoundEvent) -> Result<(Round, Vec<Effect>), RoundError> {
        let mut next = self.clone();
        let mut effects = Vec::new();

        match (self.phase, event) {
            // Idle → RequestSent: broadcast our request
            (RoundPhase::Idle, RoundEvent::Begin { timestamp }) => {
                let request = Request::new(timestamp, self.rank, self.resource.clone());
                effects.extend(self.rank.others(self.size).map(|to| Effect::SendRequest {
                    to,
                    request: request.clone(),
                }));
                next.own = Some(request);
                next.phase = RoundPhase::RequestSent;
            }

            (RoundPhase::RequestSent | RoundPhase::Collecting, RoundEvent::RequestReceived(req)) => {
                self.check_sender(req.sender)?;
                if req.resource != self.resource {
                    return Err(RoundError::ResourceMismatch {
                        from: req.sender,
                        expected: self.resource.to_string(),
                        got: req.resource.to_string(),
                    });
                }
                if self.requests[req.sender.index()].is_some() {
                    return Err(RoundError::DuplicateRequest(req.sender));
                }
                let slot = req.sender.index();
                next.requests[slot] = Some(req);
                next.phase = RoundPhase::Collecting;
            }

            // Own sends must complete and every peer must have exchanged
            // requests before anyone decides
            (RoundPhase::RequestSent | RoundPhase::Collecting, RoundEvent::RequestsCollected) => {
                let missing = self.missing_requests();
                if !missing.is_empty() {
                    return Err(RoundError::MissingRequests(missing));
                }
                effects.push(Effect::WaitSends);
                effects.push(Effect::Barrier);
                next.phase = RoundPhase::Deciding;
            }

            // Deciding → AwaitingGrants: grant every request that precedes ours
            (RoundPhase::Deciding, RoundEvent::Decide) => {
                let own = self.own_or_unexpected()?;
                for peer in self.rank.others(self.size) {
                    let Some(theirs) = self.requests[peer.index()].as_ref() else {
                        return Err(RoundError::MissingRequests(vec![peer]));
                    };
                    if theirs.precedes(own) {
                        next.immediate.push(peer);
                        effects.push(Effect::SendGrant { to: peer });
                    } else {
                        next.deferred.push(peer);
                    }
                }
                next.phase = RoundPhase::AwaitingGrants;
            }

            // Grants may overtake the decision phase: a peer that already
            // decided can grant us before we finish deciding ourselves
            (
                RoundPhase::Deciding | RoundPhase::AwaitingGrants,
                RoundEvent::GrantReceived { from },
            ) => {
                self.check_sender(from)?;
                if self.grants[from.index()] {
                    return Err(RoundError::DuplicateGrant(from));
                }
                next.grants[from.index()] = true;
            }

            (RoundPhase::AwaitingGrants, RoundEvent::Enter) => {
                if !self.is_cleared() {
                    return Err(RoundError::MissingGrants {
                        received: self.grants_received(),
                        expected: self.grants_expected(),
                    });
                }
                next.phase = RoundPhase::InSection;
            }

            (RoundPhase::InSection, RoundEvent::Exit) => {
                next.phase = RoundPhase::Releasing;
            }

            // Releasing → Done: unblock everyone we held back
            (RoundPhase::Releasing, RoundEvent::Release) => {
                effects.extend(
                    self.deferred
                        .iter()
                        .map(|to| Effect::SendGrant { to: *to }),
                );
                effects.push(Effect::WaitSends);
                next.phase = RoundPhase::Done;
            }

            (phase, event) => {
                return Err(RoundError::UnexpectedEvent {
                    phase,
                    event: event.name(),
                });
            }
        }

        Ok((next, effects))
    }

    fn check_sender(&self, from: Rank) -> Result<(), RoundError> {
        if from.index() >= self.size {
            return Err(RoundError::RankOutOfRange {
                rank: from,
                size: self.size,
            });
        }
        if from == self.rank {
            return Err(RoundError::FromSelf(from));
        }
        Ok(())
    }

    fn own_or_unexpected(&self) -> Result<&Request, RoundError> {
        self.own.as_ref().ok_or(RoundError::UnexpectedEvent {
            phase: self.phase,
            event: "decide",
        })
    }
}

#[cfg(test)]
#[path = "round_tests.rs"]
mod tests;
