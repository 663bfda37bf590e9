// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mx run` - Run a local peer group through the mutual exclusion protocol

use crate::config::{ClockKind, Config};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use mx_adapters::FileSentinel;
use mx_core::{LamportClock, ResourceName, SystemClock};
use mx_engine::{run_local_group, CoordinatorConfig, GroupConfig, HoldSection, RoundReport, Turn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Every flag overrides the matching config field
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Number of peers
    #[arg(short = 'n', long)]
    pub peers: Option<usize>,

    /// Rounds each peer runs
    #[arg(long)]
    pub rounds: Option<u64>,

    /// Resource name carried in requests (at most 80 bytes)
    #[arg(long, value_parser = parse_resource)]
    pub resource: Option<ResourceName>,

    /// Sentinel file created by the section holder
    #[arg(long)]
    pub sentinel: Option<PathBuf>,

    /// Timestamp source
    #[arg(long, value_enum)]
    pub clock: Option<ClockKind>,

    /// Shortest hold inside the section (e.g., 10ms)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub hold_min: Option<Duration>,

    /// Longest hold inside the section (e.g., 2s)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub hold_max: Option<Duration>,

    /// Fail the group if any wait takes longer than this
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl RunArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(peers) = self.peers {
            config.peers = peers;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(resource) = &self.resource {
            config.resource = resource.clone();
        }
        if let Some(sentinel) = &self.sentinel {
            config.sentinel = sentinel.clone();
        }
        if let Some(clock) = self.clock {
            config.clock = clock;
        }
        if let Some(hold_min) = self.hold_min {
            config.hold_min = hold_min;
        }
        if let Some(hold_max) = self.hold_max {
            config.hold_max = hold_max;
        }
        if self.timeout.is_some() {
            config.timeout = self.timeout;
        }
    }
}

/// Result of a completed run
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub peers: usize,
    pub rounds: u64,
    pub resource: String,
    pub sentinel: PathBuf,
    /// Every section entry, in admission order
    pub entries: Vec<RoundReport>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} peers completed {} round(s) on {}: {} entries, no overlap",
            self.peers,
            self.rounds,
            self.resource,
            self.entries.len()
        )
    }
}

pub async fn handle(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = Config::load(config_path)?;
    args.apply(&mut config);
    config.validate()?;
    tracing::debug!(?config, "resolved config");

    let group = GroupConfig {
        peers: config.peers,
        rounds: config.rounds,
        coordinator: CoordinatorConfig {
            resource: config.resource.clone(),
            timeout: config.timeout,
        },
    };
    let sentinel = FileSentinel::new(&config.sentinel);
    let hold = HoldSection::new(config.hold_min, config.hold_max);
    let progress = args.output.streams_progress();

    let body = move |turn: Turn| async move {
        if progress {
            println!("process number {} entered critical section", turn.rank);
        }
        hold.hold().await;
        if progress {
            println!("process number {} left critical section", turn.rank);
        }
    };

    let outcomes = match config.clock {
        ClockKind::Wall => {
            let clock = SystemClock::default();
            run_local_group(group, move |_| clock.clone(), sentinel, body).await
        }
        ClockKind::Lamport => run_local_group(group, |_| LamportClock::new(), sentinel, body).await,
    }
    .with_context(|| format!("mutual exclusion run on {} failed", config.sentinel.display()))?;

    let summary = RunSummary {
        peers: config.peers,
        rounds: config.rounds,
        resource: config.resource.to_string(),
        sentinel: config.sentinel,
        entries: outcomes.into_iter().map(|(_, report)| report).collect(),
    };
    output::print(&summary, args.output);
    Ok(())
}

fn parse_resource(s: &str) -> Result<ResourceName, String> {
    ResourceName::new(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = RunArgs {
            peers: Some(7),
            clock: Some(ClockKind::Lamport),
            hold_max: Some(Duration::from_millis(20)),
            timeout: Some(Duration::from_secs(3)),
            ..RunArgs::default()
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.peers, 7);
        assert_eq!(config.rounds, 1);
        assert_eq!(config.clock, ClockKind::Lamport);
        assert_eq!(config.hold_min, Duration::from_secs(1));
        assert_eq!(config.hold_max, Duration::from_millis(20));
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = Config::parse("peers = 2\ntimeout = \"5s\"").unwrap();
        RunArgs::default().apply(&mut config);
        assert_eq!(config.peers, 2);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn resource_flag_enforces_name_limit() {
        assert!(parse_resource("printer").is_ok());
        assert!(parse_resource(&"x".repeat(81)).is_err());
    }
}
