// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-layout wire encoding
//!
//! A request is exactly [`REQUEST_LEN`] bytes, little-endian:
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 8    | timestamp, IEEE-754 f64                 |
//! | 8      | 4    | sender rank, i32                        |
//! | 12     | 80   | resource name, UTF-8, NUL padded        |
//!
//! A grant is the three bytes `OK\0`.

use crate::request::{NameError, Rank, Request, ResourceName, Timestamp, MAX_RESOURCE_NAME};
use thiserror::Error;

pub const REQUEST_LEN: usize = 8 + 4 + MAX_RESOURCE_NAME;

pub const GRANT_PAYLOAD: [u8; 3] = *b"OK\0";

/// Errors decoding wire payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("request payload is {0} bytes, expected {REQUEST_LEN}")]
    RequestLength(usize),
    #[error("negative sender rank {0}")]
    NegativeRank(i32),
    #[error("rank {0} does not fit the wire format")]
    RankOverflow(Rank),
    #[error("resource name is not valid UTF-8")]
    NameEncoding,
    #[error("invalid resource name: {0}")]
    Name(#[from] NameError),
    #[error("malformed grant payload {0:?}")]
    Grant(Vec<u8>),
}

pub fn encode_request(request: &Request) -> Result<[u8; REQUEST_LEN], WireError> {
    let rank = i32::try_from(request.sender.0).map_err(|_| WireError::RankOverflow(request.sender))?;

    let mut buf = [0u8; REQUEST_LEN];
    buf[0..8].copy_from_slice(&request.timestamp.as_f64().to_le_bytes());
    buf[8..12].copy_from_slice(&rank.to_le_bytes());

    // ResourceName guarantees the name fits and carries no NUL
    let name = request.resource.as_str().as_bytes();
    buf[12..12 + name.len()].copy_from_slice(name);
    Ok(buf)
}

pub fn decode_request(bytes: &[u8]) -> Result<Request, WireError> {
    let bytes: &[u8; REQUEST_LEN] = bytes
        .try_into()
        .map_err(|_| WireError::RequestLength(bytes.len()))?;

    let mut ts = [0u8; 8];
    ts.copy_from_slice(&bytes[0..8]);
    let mut rank = [0u8; 4];
    rank.copy_from_slice(&bytes[8..12]);

    let rank = i32::from_le_bytes(rank);
    if rank < 0 {
        return Err(WireError::NegativeRank(rank));
    }

    let field = &bytes[12..];
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    let name = std::str::from_utf8(&field[..end]).map_err(|_| WireError::NameEncoding)?;

    Ok(Request {
        timestamp: Timestamp(f64::from_le_bytes(ts)),
        sender: Rank(rank as u32),
        resource: ResourceName::new(name)?,
    })
}

pub fn decode_grant(bytes: &[u8]) -> Result<(), WireError> {
    if bytes == GRANT_PAYLOAD {
        Ok(())
    } else {
        Err(WireError::Grant(bytes.to_vec()))
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
