// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The active log file: an exclusive append handle plus its byte size.

use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// The currently open, currently-being-written-to log file.
///
/// Exactly one `ActiveFile` exists per writer. It is moved by value into a
/// rotation and never shared across the rotation boundary. The tracked size
/// is seeded from a stat of any pre-existing file, so a restarted process
/// keeps honoring the size threshold instead of growing the first
/// generation without bound.
pub(crate) struct ActiveFile {
    file: File,
    path: PathBuf,
    size: u64,
    opened_at: DateTime<Utc>,
}

impl ActiveFile {
    /// Open (or create) the file in append mode, seeding the size tracker
    /// from the on-disk size.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file,
            path: path.to_owned(),
            size,
            opened_at: Utc::now(),
        })
    }

    /// Append the whole buffer. A buffer is never split across files.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        self.size += buf.len() as u64;
        Ok(buf.len())
    }

    /// Current byte size of the file.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When this handle was opened.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Fsync the handle.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }
}

#[cfg(test)]
#[path = "active_tests.rs"]
mod tests;
