// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotation tokens: the sortable suffix distinguishing backup files.
//!
//! A backup is named `<base>.<token>` (raw) or `<base>.<token>.gz`
//! (compressed). Tokens are either zero-padded sequence numbers or
//! `YYYYMMDD_HHMMSS` UTC timestamps; both formats are chosen so that string
//! sort order equals chronological order, which is what retention relies on
//! to identify "oldest".

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Width sequence tokens are zero-padded to.
const SEQ_WIDTH: usize = 6;

/// Timestamp token format. Fixed-width, so string order is time order.
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Suffix appended to compressed backups.
pub const GZ_SUFFIX: &str = ".gz";

/// How rotation tokens are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStrategy {
    /// Monotonically increasing sequence number (`000001`, `000002`, ...).
    #[default]
    Sequence,
    /// UTC timestamp (`20260824_153000`), tie-broken with a `_NN` suffix
    /// when several rotations land in the same second.
    Timestamp,
}

/// A parsed rotation token.
///
/// The derived ordering matches the lexicographic order of the formatted
/// file names, so sorting tokens sorts backups oldest-first. Across
/// strategies, every sequence token sorts before every timestamp token: a
/// directory mixing both (the strategy changed between runs) treats the
/// sequence-named backups as the older generation, so retention evicts
/// them first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RotationToken {
    Sequence(u64),
    Timestamp { stamp: NaiveDateTime, tie: u32 },
}

impl RotationToken {
    /// Timestamp token for `now`, truncated to whole seconds, tie 0.
    pub fn timestamp(now: DateTime<Utc>) -> Self {
        let stamp = DateTime::from_timestamp(now.timestamp(), 0)
            .map_or_else(|| now.naive_utc(), |d| d.naive_utc());
        Self::Timestamp { stamp, tie: 0 }
    }

    /// Same token with a different tie-breaker. No-op for sequence tokens.
    pub(crate) fn with_tie(self, tie: u32) -> Self {
        match self {
            Self::Timestamp { stamp, .. } => Self::Timestamp { stamp, tie },
            other => other,
        }
    }

    /// The point in time this token implies, if any.
    ///
    /// Sequence tokens carry no timestamp, which is why age-based retention
    /// requires [`TokenStrategy::Timestamp`].
    pub fn implied_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Sequence(_) => None,
            Self::Timestamp { stamp, .. } => Some(stamp.and_utc()),
        }
    }

    /// Strict parse of a token string.
    ///
    /// Anything unrecognized yields `None`; callers treat such files as
    /// foreign and never delete them.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s.parse().ok().map(Self::Sequence);
        }
        if s.len() < 15 || !s.is_char_boundary(15) {
            return None;
        }
        let (head, rest) = s.split_at(15);
        let stamp = NaiveDateTime::parse_from_str(head, STAMP_FORMAT).ok()?;
        let tie = if rest.is_empty() {
            0
        } else {
            let digits = rest.strip_prefix('_')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()?
        };
        Some(Self::Timestamp { stamp, tie })
    }
}

impl fmt::Display for RotationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence(n) => write!(f, "{n:0width$}", width = SEQ_WIDTH),
            Self::Timestamp { stamp, tie: 0 } => write!(f, "{}", stamp.format(STAMP_FORMAT)),
            Self::Timestamp { stamp, tie } => {
                write!(f, "{}_{tie:02}", stamp.format(STAMP_FORMAT))
            }
        }
    }
}

/// `<base>.<token>` in the same directory as `base`.
pub(crate) fn backup_path(base: &Path, token: &RotationToken) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(token.to_string());
    PathBuf::from(name)
}

/// The `.gz` sibling of a raw backup path.
pub(crate) fn compressed_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(GZ_SUFFIX);
    PathBuf::from(name)
}

/// Parse `<base_name>.<token>[.gz]` back into a token.
///
/// Returns `None` for the active file itself and for any name that does not
/// carry a recognizable token.
pub(crate) fn parse_backup_name(base_name: &str, file_name: &str) -> Option<RotationToken> {
    let rest = file_name.strip_prefix(base_name)?;
    let rest = rest.strip_prefix('.')?;
    let token_str = rest.strip_suffix(GZ_SUFFIX).unwrap_or(rest);
    RotationToken::parse(token_str)
}

/// Directory holding the log and its backups.
pub(crate) fn log_dir(base: &Path) -> PathBuf {
    match base.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_owned(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
