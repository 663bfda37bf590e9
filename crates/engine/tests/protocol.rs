// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end protocol runs against a sentinel file on disk

#![allow(clippy::unwrap_used)]

use mx_adapters::{FileSentinel, Sentinel};
use mx_core::{FakeClock, LamportClock, Rank, ResourceName, SystemClock};
use mx_engine::{run_local_group, CoordinatorConfig, GroupConfig, GroupError, HoldSection, Turn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn config(peers: usize, rounds: u64) -> GroupConfig {
    GroupConfig {
        peers,
        rounds,
        coordinator: CoordinatorConfig::new(ResourceName::new("printer").unwrap())
            .with_timeout(Duration::from_secs(10)),
    }
}

#[tokio::test]
async fn file_sentinel_is_gone_after_a_clean_run() {
    let dir = tempdir().unwrap();
    let sentinel = FileSentinel::new(dir.path().join("sentinel"));
    let hold = HoldSection::new(Duration::from_millis(1), Duration::from_millis(3));

    let outcomes = run_local_group(
        config(4, 3),
        |_| LamportClock::new(),
        sentinel.clone(),
        move |_| async move { hold.hold().await },
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 12);
    assert!(!sentinel.is_present());
}

#[tokio::test]
async fn at_most_one_peer_inside_at_a_time() {
    let dir = tempdir().unwrap();
    let sentinel = FileSentinel::new(dir.path().join("sentinel"));
    let inside = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let clock = SystemClock::default();

    let body = {
        let inside = Arc::clone(&inside);
        let peak = Arc::clone(&peak);
        move |_: Turn| {
            let inside = Arc::clone(&inside);
            let peak = Arc::clone(&peak);
            async move {
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }
        }
    };

    run_local_group(config(6, 3), move |_| clock.clone(), sentinel, body)
        .await
        .unwrap();

    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sentinel_file_records_the_holder() {
    let dir = tempdir().unwrap();
    let sentinel = FileSentinel::new(dir.path().join("sentinel"));
    let observed = sentinel.clone();
    let timestamps = [5.0, 3.0, 3.0];

    let outcomes = run_local_group(
        config(3, 1),
        move |rank: Rank| FakeClock::at(timestamps[rank.index()]),
        sentinel,
        move |turn| {
            let holder = observed.holder();
            async move { (turn.rank, holder) }
        },
    )
    .await
    .unwrap();

    let seen: Vec<(Rank, Option<Rank>)> = outcomes.into_iter().map(|(seen, _)| seen).collect();
    assert_eq!(
        seen,
        vec![
            (Rank(1), Some(Rank(1))),
            (Rank(2), Some(Rank(2))),
            (Rank(0), Some(Rank(0))),
        ]
    );
}

#[tokio::test]
async fn stale_sentinel_file_fails_the_run() {
    let dir = tempdir().unwrap();
    let sentinel = FileSentinel::new(dir.path().join("sentinel"));
    sentinel.acquire(Rank(7)).unwrap();

    let err = run_local_group(
        config(3, 2),
        |_| LamportClock::new(),
        sentinel.clone(),
        |_| async {},
    )
    .await
    .unwrap_err();

    assert!(matches!(err, GroupError::Peer { .. }));
    assert!(err.is_violation());
    assert!(err.to_string().contains("already present"));
    assert_eq!(sentinel.holder(), Some(Rank(7)));
}
