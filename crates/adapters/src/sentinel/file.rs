// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sentinel backed by a file visible to every peer

use super::{Sentinel, SentinelError};
use mx_core::Rank;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A marker file created with create-new semantics, holding the holder's rank
#[derive(Clone, Debug)]
pub struct FileSentinel {
    path: PathBuf,
}

impl FileSentinel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_present(&self) -> bool {
        self.path.exists()
    }

    /// Write the holder's rank into a freshly created marker. On failure the
    /// marker is removed so the next run does not mistake it for a holder.
    fn record(&self, mut out: impl Write, holder: Rank) -> Result<(), SentinelError> {
        if let Err(e) = writeln!(out, "{}", holder).and_then(|()| out.flush()) {
            let _ = std::fs::remove_file(&self.path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Rank recorded by the current holder, if the marker exists
    pub fn holder(&self) -> Option<Rank> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        content.trim().parse().ok().map(Rank)
    }
}

impl Sentinel for FileSentinel {
    fn acquire(&self, holder: Rank) -> Result<(), SentinelError> {
        let file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SentinelError::AlreadyPresent(self.describe()));
            }
            Err(e) => return Err(e.into()),
        };
        self.record(file, holder)
    }

    fn release(&self, _holder: Rank) -> Result<(), SentinelError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SentinelError::Missing(self.describe()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
