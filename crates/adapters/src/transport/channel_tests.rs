// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn msg(tag: Tag, payload: &[u8]) -> Message {
    Message::new(tag, 1, payload.to_vec())
}

fn pair() -> (ChannelTransport, ChannelTransport) {
    let mut group = ChannelTransport::group(2).unwrap();
    let b = group.pop().unwrap();
    let a = group.pop().unwrap();
    (a, b)
}

#[test]
fn group_assigns_ranks_in_order() {
    let group = ChannelTransport::group(3).unwrap();
    let ranks: Vec<u32> = group.iter().map(|t| t.rank().0).collect();
    assert_eq!(ranks, vec![0, 1, 2]);
    assert!(group.iter().all(|t| t.size() == 3));
}

#[test]
fn empty_group_is_rejected() {
    assert!(matches!(
        ChannelTransport::group(0),
        Err(TransportError::EmptyGroup)
    ));
}

#[tokio::test]
async fn send_then_recv_from_explicit_source() {
    let (a, b) = pair();
    let handle = a.send(Rank(1), msg(Tag::Request, b"hello")).unwrap();
    a.wait_all(vec![handle]).await.unwrap();

    let envelope = b.recv(Source::Rank(Rank(0)), Tag::Request).await.unwrap();
    assert_eq!(envelope.source, Rank(0));
    assert_eq!(envelope.message.payload, b"hello");
}

#[tokio::test]
async fn messages_from_one_sender_stay_in_order() {
    let (a, b) = pair();
    for i in 0..5u8 {
        let _ = a.send(Rank(1), msg(Tag::Grant, &[i])).unwrap();
    }
    for i in 0..5u8 {
        let envelope = b.recv(Source::Any, Tag::Grant).await.unwrap();
        assert_eq!(envelope.message.payload, vec![i]);
    }
}

#[tokio::test]
async fn recv_is_selective_by_tag_and_source() {
    let group = ChannelTransport::group(3).unwrap();
    let _ = group[0].send(Rank(2), msg(Tag::Grant, b"g0")).unwrap();
    let _ = group[1].send(Rank(2), msg(Tag::Request, b"r1")).unwrap();
    let _ = group[0].send(Rank(2), msg(Tag::Request, b"r0")).unwrap();

    let r0 = group[2].recv(Source::Rank(Rank(0)), Tag::Request).await.unwrap();
    assert_eq!(r0.message.payload, b"r0");
    let r1 = group[2].recv(Source::Rank(Rank(1)), Tag::Request).await.unwrap();
    assert_eq!(r1.message.payload, b"r1");
    let g = group[2].recv(Source::Any, Tag::Grant).await.unwrap();
    assert_eq!(g.source, Rank(0));
    assert_eq!(group[2].pending(), 0);
}

#[tokio::test]
async fn recv_blocks_until_message_arrives() {
    let (a, b) = pair();
    let receiver = tokio::spawn(async move { b.recv(Source::Rank(Rank(0)), Tag::Grant).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!receiver.is_finished());

    let _ = a.send(Rank(1), msg(Tag::Grant, b"OK\0")).unwrap();
    let envelope = receiver.await.unwrap().unwrap();
    assert_eq!(envelope.source, Rank(0));
}

#[tokio::test]
async fn send_to_self_or_stranger_fails() {
    let (a, _b) = pair();
    assert_eq!(
        a.send(Rank(0), msg(Tag::Grant, b"")).unwrap_err(),
        TransportError::SelfSend(Rank(0))
    );
    assert_eq!(
        a.send(Rank(5), msg(Tag::Grant, b"")).unwrap_err(),
        TransportError::UnknownPeer {
            rank: Rank(5),
            size: 2
        }
    );
}

#[tokio::test]
async fn barrier_releases_once_all_peers_arrive() {
    let group = ChannelTransport::group(3).unwrap();
    let tasks: Vec<_> = group
        .into_iter()
        .map(|t| tokio::spawn(async move { t.barrier().await }))
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn abort_wakes_blocked_receivers_and_barriers() {
    let group = ChannelTransport::group(3).unwrap();
    let receiver = {
        let t = group[1].clone();
        tokio::spawn(async move { t.recv(Source::Any, Tag::Grant).await })
    };
    let waiter = {
        let t = group[2].clone();
        tokio::spawn(async move { t.barrier().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    group[0].abort("sentinel already present");

    assert_eq!(
        receiver.await.unwrap().unwrap_err(),
        TransportError::Aborted("sentinel already present".into())
    );
    assert!(matches!(
        waiter.await.unwrap(),
        Err(TransportError::Aborted(_))
    ));
}

#[tokio::test]
async fn first_abort_reason_wins_and_blocks_sends() {
    let (a, b) = pair();
    a.abort("first");
    b.abort("second");

    assert_eq!(b.abort_reason().as_deref(), Some("first"));
    assert_eq!(
        b.send(Rank(0), msg(Tag::Grant, b"")).unwrap_err(),
        TransportError::Aborted("first".into())
    );
    assert!(a.wait_all(Vec::new()).await.is_err());
}
