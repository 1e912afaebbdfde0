// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use logroll::{ErrorSink, ReportedError};

/// Temporary log directory with helper methods.
pub struct LogDir {
    dir: tempfile::TempDir,
}

impl LogDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Path of the active log file inside this directory.
    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("app.log")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Sorted file names of everything except the active file.
    pub fn backups(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n != "app.log")
            .collect();
        names.sort();
        names
    }

    /// Raw contents of a file in this directory, gunzipping `.gz` names.
    pub fn contents(&self, name: &str) -> Vec<u8> {
        let path = self.dir.path().join(name);
        if name.ends_with(".gz") {
            let mut decoder = GzDecoder::new(fs::File::open(&path).unwrap());
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).unwrap();
            out
        } else {
            fs::read(&path).unwrap()
        }
    }

    /// Every byte written so far, oldest backup first, active file last.
    pub fn all_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for name in self.backups() {
            out.extend(self.contents(&name));
        }
        out.extend(fs::read(self.log_path()).unwrap());
        out
    }
}

/// An error sink that records a short label per reported error.
pub fn recording_sink() -> (ErrorSink, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink: ErrorSink = Arc::new(move |error: &ReportedError| {
        let label = match error {
            ReportedError::Rotation(_) => "rotation",
            ReportedError::Compression { .. } => "compression",
            ReportedError::Retention(_) => "retention",
            ReportedError::RetentionDelete { .. } => "retention-delete",
        };
        sink_seen.lock().unwrap().push(label.to_string());
    });
    (sink, seen)
}
