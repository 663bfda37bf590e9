// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_transport_records_sends() {
    let transport = FakeTransport::new(Rank(0), 3);
    let handle = transport
        .send(Rank(2), Message::new(Tag::Grant, 1, b"OK\0".to_vec()))
        .unwrap();
    transport.wait_all(vec![handle]).await.unwrap();

    assert_eq!(transport.sent_to(Tag::Grant), vec![Rank(2)]);
    assert_eq!(
        transport.calls().last(),
        Some(&TransportCall::WaitAll { count: 1 })
    );
}

#[tokio::test]
async fn fake_transport_delivers_scripted_messages() {
    let transport = FakeTransport::new(Rank(0), 3);
    transport.deliver(Rank(2), Message::new(Tag::Grant, 1, b"a".to_vec()));
    transport.deliver(Rank(1), Message::new(Tag::Request, 1, b"b".to_vec()));

    let envelope = transport
        .recv(Source::Rank(Rank(1)), Tag::Request)
        .await
        .unwrap();
    assert_eq!(envelope.message.payload, b"b");

    let envelope = transport.recv(Source::Any, Tag::Grant).await.unwrap();
    assert_eq!(envelope.source, Rank(2));
}

#[tokio::test]
async fn fake_transport_fails_fast_without_message() {
    let transport = FakeTransport::new(Rank(0), 2);
    let result = transport.recv(Source::Any, Tag::Grant).await;
    assert_eq!(
        result.unwrap_err(),
        TransportError::NoMessage {
            from: Source::Any,
            tag: Tag::Grant
        }
    );
}

#[tokio::test]
async fn fake_transport_abort_poisons_later_calls() {
    let transport = FakeTransport::new(Rank(1), 2);
    transport.abort("boom");

    assert_eq!(transport.abort_reason().as_deref(), Some("boom"));
    assert!(transport.barrier().await.is_err());
    assert!(transport
        .send(Rank(0), Message::new(Tag::Grant, 1, Vec::new()))
        .is_err());
}
