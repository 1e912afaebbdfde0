// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention sweep: enumerate backups, keep the newest, delete the excess.
//!
//! The sweep rediscovers backups from a fresh directory listing every time;
//! there is no shared in-memory list with the compressor. A raw file that
//! retention deletes just before compression opens it surfaces there as a
//! benign "not found", and vice versa a file the compressor consumed is
//! skipped here the same way. While a compression is in flight both the raw
//! file and its `.gz` exist; the sweep groups them by token so the pair is
//! one backup, not two.

use crate::policy::RotationPolicy;
use crate::token::{self, RotationToken};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that abort a sweep before any deletion decisions are made.
#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("failed to list log directory {dir}: {source}")]
    List { dir: PathBuf, source: io::Error },
}

/// Result of one retention sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Logical backups (distinct tokens) found at sweep time.
    pub examined: usize,
    /// Files removed by this sweep.
    pub deleted: Vec<PathBuf>,
    /// Per-file deletion failures; the sweep continues past them.
    pub errors: Vec<(PathBuf, io::Error)>,
}

/// Delete backups of `base` that exceed the policy's count or age bound.
///
/// Files whose names do not parse as `<base>.<token>[.gz]` are ignored,
/// never deleted. A raw/`.gz` pair sharing a token is one backup, kept or
/// evicted together. Oldest backups go first; the k survivors of a count
/// bound are exactly the k largest tokens.
pub(crate) fn sweep(
    base: &Path,
    policy: &RotationPolicy,
    now: DateTime<Utc>,
) -> Result<SweepReport, RetentionError> {
    let dir = token::log_dir(base);
    let Some(base_name) = base.file_name().and_then(|n| n.to_str()) else {
        return Ok(SweepReport::default());
    };

    let entries = fs::read_dir(&dir).map_err(|source| RetentionError::List {
        dir: dir.clone(),
        source,
    })?;

    // Grouped by token so an in-flight compression's raw/.gz pair counts
    // once. BTreeMap iteration is oldest-first, since token order is age
    // order.
    let mut backups: BTreeMap<RotationToken, Vec<PathBuf>> = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|source| RetentionError::List {
            dir: dir.clone(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(parsed) = token::parse_backup_name(base_name, name) {
            backups.entry(parsed).or_default().push(entry.path());
        }
    }

    let mut report = SweepReport {
        examined: backups.len(),
        ..SweepReport::default()
    };

    let cutoff = policy
        .max_age
        .and_then(|age| chrono::Duration::from_std(age).ok())
        .and_then(|age| now.checked_sub_signed(age));

    // Age bound first: a token older than the cutoff goes no matter how few
    // backups remain.
    let mut survivors: Vec<Vec<PathBuf>> = Vec::new();
    let mut doomed: Vec<PathBuf> = Vec::new();
    for (parsed, paths) in backups {
        match (cutoff, parsed.implied_time()) {
            (Some(c), Some(t)) if t < c => doomed.extend(paths),
            _ => survivors.push(paths),
        }
    }

    // Count bound on the logical backups that survived the age check.
    if let Some(max) = policy.max_backups {
        if survivors.len() > max {
            let excess = survivors.len() - max;
            doomed.extend(survivors.drain(..excess).flatten());
        }
    }

    for path in doomed {
        match fs::remove_file(&path) {
            Ok(()) => report.deleted.push(path),
            // Already gone: the compressor replaced or consumed it.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => report.errors.push((path, e)),
        }
    }

    debug!(
        dir = %dir.display(),
        examined = report.examined,
        deleted = report.deleted.len(),
        failed = report.errors.len(),
        "retention sweep complete",
    );

    Ok(report)
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
