// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotation engine: decides when to roll the active file and performs the
//! close → rename → reopen handoff.
//!
//! The engine is the only component allowed to change the active file
//! identity. It runs inside the writer's critical section and is kept fast:
//! no compression, no directory sweeps, just a rename and a reopen.

use crate::active::ActiveFile;
use crate::token::{self, RotationToken, TokenStrategy};
use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound for same-second timestamp tie-breaking. Two digits keeps the
/// `_NN` suffix lexicographically ordered.
const MAX_TIE: u32 = 99;

/// Errors from a rotation attempt.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The backup target already exists. Rotation is aborted rather than
    /// silently overwriting; the pending write proceeds against the
    /// still-open oversized file.
    #[error("backup target already exists: {path}")]
    Conflict { path: PathBuf },
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// A fresh file could not be opened at the active path. Terminal for
    /// the writer: there is nowhere left to put bytes.
    #[error("failed to reopen active file {path}: {source}")]
    Reopen { path: PathBuf, source: io::Error },
}

/// A completed rotation: the fresh active handle and the retired backup.
pub(crate) struct Rotation {
    pub active: ActiveFile,
    pub backup: PathBuf,
}

/// A failed rotation.
pub(crate) enum RotateFailure {
    /// The original path was reopened; the writer stays writable and the
    /// pending write proceeds into the oversized file.
    Recovered {
        active: ActiveFile,
        error: RotationError,
    },
    /// The active path could not be reopened. Terminal.
    Fatal(RotationError),
}

pub(crate) struct RotationEngine {
    path: PathBuf,
    strategy: TokenStrategy,
    /// Next sequence number, seeded by scanning existing backups so that
    /// numbering continues across restarts.
    next_seq: u64,
}

impl RotationEngine {
    pub fn new(path: &Path, strategy: TokenStrategy) -> io::Result<Self> {
        let next_seq = match strategy {
            TokenStrategy::Sequence => highest_sequence(path)? + 1,
            TokenStrategy::Timestamp => 1,
        };
        Ok(Self {
            path: path.to_owned(),
            strategy,
            next_seq,
        })
    }

    /// Pre-write threshold check: rotate when the pending write would push a
    /// non-empty active file past `max_size`.
    ///
    /// An oversized write into an empty file lands whole in that file
    /// instead of producing an empty backup first.
    pub fn should_rotate(current_size: u64, incoming: usize, max_size: u64) -> bool {
        current_size > 0 && current_size.saturating_add(incoming as u64) > max_size
    }

    /// Retire `active` to a token-suffixed backup and reopen fresh.
    pub fn rotate(&mut self, active: ActiveFile) -> Result<Rotation, RotateFailure> {
        // Flush before the handle is dropped. Close semantics for buffered
        // data vary by platform; a sync failure here is logged and the
        // rename proceeds, since the backup keeps everything the OS
        // accepted.
        if let Err(e) = active.sync() {
            warn!(path = %self.path.display(), error = %e, "fsync before rotation failed");
        }
        let retired_age = Utc::now() - active.opened_at();
        drop(active);

        let backup = match self.next_backup_path() {
            Ok(p) => p,
            Err(error) => return self.recover(error),
        };

        if let Err(source) = fs::rename(&self.path, &backup) {
            let error = RotationError::Rename {
                from: self.path.clone(),
                to: backup,
                source,
            };
            return self.recover(error);
        }

        // Reopen stats the path, so if something else recreated a file
        // there in the meantime the tracked size reflects it rather than
        // assuming zero.
        match ActiveFile::open(&self.path) {
            Ok(fresh) => {
                if self.strategy == TokenStrategy::Sequence {
                    self.next_seq += 1;
                }
                debug!(
                    backup = %backup.display(),
                    age_secs = retired_age.num_seconds(),
                    "active file rotated",
                );
                Ok(Rotation {
                    active: fresh,
                    backup,
                })
            }
            Err(source) => Err(RotateFailure::Fatal(RotationError::Reopen {
                path: self.path.clone(),
                source,
            })),
        }
    }

    /// Reopen the original path after a non-fatal failure so the caller's
    /// write still has somewhere to land.
    fn recover(&self, error: RotationError) -> Result<Rotation, RotateFailure> {
        match ActiveFile::open(&self.path) {
            Ok(active) => Err(RotateFailure::Recovered { active, error }),
            Err(source) => Err(RotateFailure::Fatal(RotationError::Reopen {
                path: self.path.clone(),
                source,
            })),
        }
    }

    /// Compute the backup path for the next rotation.
    ///
    /// Sequence: the next number in line; a file already there is a
    /// conflict, never an overwrite. Timestamp: the current second, probing
    /// ties against both the raw and `.gz` names.
    fn next_backup_path(&self) -> Result<PathBuf, RotationError> {
        match self.strategy {
            TokenStrategy::Sequence => {
                let candidate =
                    token::backup_path(&self.path, &RotationToken::Sequence(self.next_seq));
                if candidate.exists() || token::compressed_path(&candidate).exists() {
                    return Err(RotationError::Conflict { path: candidate });
                }
                Ok(candidate)
            }
            TokenStrategy::Timestamp => {
                let base = RotationToken::timestamp(Utc::now());
                for tie in 0..=MAX_TIE {
                    let candidate = token::backup_path(&self.path, &base.with_tie(tie));
                    if !candidate.exists() && !token::compressed_path(&candidate).exists() {
                        return Ok(candidate);
                    }
                }
                Err(RotationError::Conflict {
                    path: token::backup_path(&self.path, &base.with_tie(MAX_TIE)),
                })
            }
        }
    }
}

/// Highest existing sequence token for this base path, 0 if none.
fn highest_sequence(path: &Path) -> io::Result<u64> {
    let Some(base_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(0);
    };
    let mut highest = 0;
    for entry in fs::read_dir(token::log_dir(path))? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(RotationToken::Sequence(n)) = token::parse_backup_name(base_name, name) {
            highest = highest.max(n);
        }
    }
    Ok(highest)
}

#[cfg(test)]
#[path = "rotation_tests.rs"]
mod tests;
