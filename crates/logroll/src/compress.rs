// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background gzip compression of retired backups.
//!
//! Ordering is the correctness property: the destination is fully written,
//! flushed, and closed before the source is deleted. A failure part-way
//! removes the partial `.gz` and leaves the raw backup in place, so the
//! directory never ends up with neither file.

use crate::token;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from compressing one backup. Never fatal to the writer; a missed
/// compression just leaves one extra raw backup for retention to count.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of compressing one backup.
#[derive(Debug)]
pub(crate) enum CompressOutcome {
    /// The raw backup was replaced by `dest`.
    Compressed { dest: PathBuf },
    /// The raw backup disappeared before compression started: the benign
    /// race with a concurrent retention sweep.
    SourceMissing,
}

/// Compress `path` into `path.gz`, then delete `path`.
///
/// Blocking; the writer runs this on a background thread off the write path.
pub(crate) fn compress_backup(path: &Path) -> Result<CompressOutcome, CompressError> {
    let source = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "backup vanished before compression, skipping");
            return Ok(CompressOutcome::SourceMissing);
        }
        Err(e) => return Err(e.into()),
    };

    let dest = token::compressed_path(path);
    if let Err(e) = write_gz(source, &dest) {
        // Never leave a partial destination behind; the raw file stays.
        let _ = fs::remove_file(&dest);
        return Err(e.into());
    }

    // The destination is durable and closed; only now drop the original. An
    // already-missing original means a concurrent sweep evicted it
    // mid-compression; the compressed copy is the backup's surviving form
    // and stays.
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            let _ = fs::remove_file(&dest);
            return Err(e.into());
        }
    }

    Ok(CompressOutcome::Compressed { dest })
}

/// Stream `source` through a gzip encoder into `dest`, fsync, close.
fn write_gz(source: File, dest: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(source);
    let out = File::create(dest)?;
    let mut encoder = GzEncoder::new(BufWriter::new(out), Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    let writer = encoder.finish()?;
    let out = writer.into_inner().map_err(|e| e.into_error())?;
    out.sync_all()?;
    Ok(())
}

#[cfg(test)]
#[path = "compress_tests.rs"]
mod tests;
