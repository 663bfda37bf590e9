// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mx order <timestamp:rank>...` - Show the order in which requests are admitted

use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use clap::Args;
use mx_core::{admission_order, PriorityKey, Rank};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Args)]
pub struct OrderArgs {
    /// Requests as `timestamp:rank` pairs (e.g., 5:0 3:1 3:2)
    #[arg(required = true, value_parser = parse_request, allow_negative_numbers = true)]
    pub requests: Vec<PriorityKey>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// One entry of the admission order
#[derive(Debug, Serialize)]
pub struct Admission {
    pub position: usize,
    pub rank: u32,
    pub timestamp: f64,
}

impl std::fmt::Display for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. rank {} (timestamp {:.6})",
            self.position, self.rank, self.timestamp
        )
    }
}

pub fn handle(args: OrderArgs) -> Result<()> {
    let mut seen = HashSet::new();
    for key in &args.requests {
        if !seen.insert(key.rank) {
            bail!("rank {} appears more than once", key.rank);
        }
    }

    let admissions: Vec<Admission> = admission_order(args.requests)
        .into_iter()
        .enumerate()
        .map(|(i, key)| Admission {
            position: i + 1,
            rank: key.rank.0,
            timestamp: key.timestamp.as_f64(),
        })
        .collect();

    output::print_list(&admissions, args.output);
    Ok(())
}

fn parse_request(s: &str) -> Result<PriorityKey, String> {
    let (timestamp, rank) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("invalid request `{s}`: expected timestamp:rank"))?;
    let timestamp: f64 = timestamp
        .parse()
        .map_err(|e| format!("invalid timestamp `{timestamp}`: {e}"))?;
    let rank: u32 = rank
        .parse()
        .map_err(|e| format!("invalid rank `{rank}`: {e}"))?;
    Ok(PriorityKey::new(timestamp, Rank(rank)))
}
