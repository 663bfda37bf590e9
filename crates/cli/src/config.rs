// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mx.toml` configuration

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use mx_core::ResourceName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read from the working directory when `--config` is absent
pub const DEFAULT_CONFIG: &str = "mx.toml";

/// Where request timestamps come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// Seconds elapsed since a reference instant shared by the group
    #[default]
    Wall,
    /// Lamport counter, merged with every request seen
    Lamport,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of peers in the group
    pub peers: usize,
    /// Rounds each peer runs
    pub rounds: u64,
    /// Resource name carried in requests
    pub resource: ResourceName,
    /// Marker file created by the section holder
    pub sentinel: PathBuf,
    pub clock: ClockKind,
    /// Shortest time a peer stays in the section
    #[serde(with = "humantime_serde")]
    pub hold_min: Duration,
    /// Longest time a peer stays in the section
    #[serde(with = "humantime_serde")]
    pub hold_max: Duration,
    /// Bound on every blocking wait; unset waits forever
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peers: 4,
            rounds: 1,
            resource: ResourceName::default(),
            sentinel: PathBuf::from("critical.txt"),
            clock: ClockKind::Wall,
            hold_min: Duration::from_secs(1),
            hold_max: Duration::from_secs(5),
            timeout: None,
        }
    }
}

impl Config {
    /// Load `path`, or `mx.toml` if it exists, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject settings no group can run with
    pub fn validate(&self) -> Result<()> {
        if self.peers == 0 {
            bail!("peers must be at least 1");
        }
        if self.rounds == 0 {
            bail!("rounds must be at least 1");
        }
        if self.hold_min > self.hold_max {
            bail!(
                "hold_min ({}) exceeds hold_max ({})",
                humantime::format_duration(self.hold_min),
                humantime::format_duration(self.hold_max)
            );
        }
        if self.timeout == Some(Duration::ZERO) {
            bail!("timeout must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
