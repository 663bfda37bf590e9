// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn request(t: f64, rank: u32, name: &str) -> Request {
    Request::new(t, Rank(rank), ResourceName::new(name).unwrap())
}

#[test]
fn request_layout_is_fixed() {
    let bytes = encode_request(&request(1.5, 7, "critical")).unwrap();

    assert_eq!(bytes.len(), 92);
    assert_eq!(&bytes[0..8], &1.5f64.to_le_bytes());
    assert_eq!(&bytes[8..12], &7i32.to_le_bytes());
    assert_eq!(&bytes[12..20], b"critical");
    assert!(bytes[20..].iter().all(|b| *b == 0));
}

#[test]
fn request_survives_the_wire() {
    let original = request(0.000123, 3, "printer");
    let decoded = decode_request(&encode_request(&original).unwrap()).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn full_width_name_has_no_terminator() {
    let name = "n".repeat(MAX_RESOURCE_NAME);
    let original = request(2.0, 0, &name);
    let bytes = encode_request(&original).unwrap();
    assert_eq!(bytes[REQUEST_LEN - 1], b'n');
    assert_eq!(decode_request(&bytes).unwrap().resource.as_str(), name);
}

#[test]
fn decode_rejects_wrong_length() {
    assert_eq!(decode_request(&[0u8; 91]), Err(WireError::RequestLength(91)));
    assert_eq!(decode_request(&[0u8; 96]), Err(WireError::RequestLength(96)));
}

#[test]
fn decode_rejects_negative_rank() {
    let mut bytes = encode_request(&request(1.0, 0, "critical")).unwrap();
    bytes[8..12].copy_from_slice(&(-2i32).to_le_bytes());
    assert_eq!(decode_request(&bytes), Err(WireError::NegativeRank(-2)));
}

#[test]
fn decode_rejects_invalid_utf8_name() {
    let mut bytes = encode_request(&request(1.0, 0, "")).unwrap();
    bytes[12] = 0xff;
    assert_eq!(decode_request(&bytes), Err(WireError::NameEncoding));
}

#[test]
fn encode_rejects_rank_beyond_i32() {
    let req = request(1.0, u32::MAX, "critical");
    assert_eq!(
        encode_request(&req),
        Err(WireError::RankOverflow(Rank(u32::MAX)))
    );
}

#[test]
fn grant_payload_is_ok_with_terminator() {
    assert!(decode_grant(b"OK\0").is_ok());
    assert_eq!(decode_grant(b"NO\0"), Err(WireError::Grant(b"NO\0".to_vec())));
    assert!(decode_grant(b"OK").is_err());
}
