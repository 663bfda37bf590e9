// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local peer group: one tokio task per peer over an in-process transport

use crate::{Coordinator, CoordinatorConfig, CoordinatorError, RoundReport, Turn};
use mx_adapters::{
    ChannelTransport, Sentinel, TracedSentinel, TracedTransport, Transport, TransportError,
};
use mx_core::{Clock, PriorityKey, Rank};
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

/// Errors from running a whole group
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("cannot build group: {0}")]
    Setup(#[from] TransportError),
    #[error("peer {rank} failed: {source}")]
    Peer {
        rank: Rank,
        source: CoordinatorError,
    },
    #[error("peer {rank} task failed: {source}")]
    Join {
        rank: Rank,
        source: JoinError,
    },
}

impl GroupError {
    pub fn is_violation(&self) -> bool {
        matches!(self, GroupError::Peer { source, .. } if source.is_violation())
    }
}

/// Settings shared by every peer of a local group
#[derive(Debug, Clone)]
pub struct GroupConfig {
    pub peers: usize,
    pub rounds: u64,
    pub coordinator: CoordinatorConfig,
}

/// Run `config.rounds` rounds on `config.peers` concurrent peers
///
/// `clock` builds each peer's clock; `body` is the critical section. On
/// success the reports come back in admission order, round by round. On
/// failure the error of the peer that caused the abort is returned rather
/// than the follow-on aborts of the others.
pub async fn run_local_group<C, K, S, B, Fut, O>(
    config: GroupConfig,
    clock: K,
    sentinel: S,
    body: B,
) -> Result<Vec<(O, RoundReport)>, GroupError>
where
    C: Clock + 'static,
    K: Fn(Rank) -> C,
    S: Sentinel,
    B: Fn(Turn) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = O> + Send,
    O: Send + 'static,
{
    let transports = ChannelTransport::group(config.peers)?;
    let Some(controller) = transports.first().cloned() else {
        return Err(GroupError::Setup(TransportError::EmptyGroup));
    };
    tracing::info!(
        peers = config.peers,
        rounds = config.rounds,
        resource = %config.coordinator.resource,
        sentinel = %sentinel.describe(),
        "starting group"
    );

    let mut tasks = JoinSet::new();
    let mut ranks = HashMap::with_capacity(transports.len());
    for transport in transports {
        let rank = transport.rank();
        let clock = clock(rank);
        let sentinel = TracedSentinel::new(sentinel.clone());
        let coordinator_config = config.coordinator.clone();
        let body = body.clone();
        let rounds = config.rounds;

        let peer = async move {
            let mut coordinator = Coordinator::new(
                TracedTransport::new(transport),
                clock,
                sentinel,
                coordinator_config,
            )?;
            coordinator.run_rounds(rounds, body).await
        };
        let span = tracing::info_span!("peer", %rank);
        let handle = tasks.spawn(async move { (rank, peer.await) }.instrument(span));
        ranks.insert(handle.id(), rank);
    }

    // Peers are joined as they finish so a panicking peer aborts the group
    // while the others are still blocked on it
    let mut outcomes = Vec::new();
    let mut root_cause = None;
    let mut follow_on = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(results))) => outcomes.extend(results),
            Ok((rank, Err(source))) => {
                let slot = if source.is_aborted() {
                    &mut follow_on
                } else {
                    &mut root_cause
                };
                slot.get_or_insert(GroupError::Peer { rank, source });
            }
            Err(source) => {
                let rank = ranks.get(&source.id()).copied().unwrap_or(Rank(0));
                tracing::error!(%rank, error = %source, "peer task failed");
                controller.abort(&format!("peer {} task failed", rank));
                root_cause.get_or_insert(GroupError::Join { rank, source });
            }
        }
    }

    if let Some(error) = root_cause.or(follow_on) {
        return Err(error);
    }

    outcomes.sort_by_key(|(_, report)| {
        (
            report.round,
            PriorityKey::new(report.timestamp, Rank(report.rank)),
        )
    });
    tracing::info!(rounds = config.rounds, entries = outcomes.len(), "group finished");
    Ok(outcomes)
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
