// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The rotating writer facade: the only public write surface.
//!
//! One mutex serializes {size check, rotate if needed, write, size update},
//! so concurrent callers never interleave bytes or split a buffer across
//! two file generations. Rotation runs inside that critical section and is
//! kept cheap; compression and retention are dispatched as fire-and-forget
//! background threads that never hold the writer's lock.

use crate::active::ActiveFile;
use crate::compress::{self, CompressError, CompressOutcome};
use crate::policy::{PolicyError, RotationPolicy};
use crate::retention::{self, RetentionError, SweepReport};
use crate::rotation::{RotateFailure, Rotation, RotationEngine, RotationError};
use chrono::Utc;
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned synchronously from [`RotatingWriter`] operations.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("invalid rotation policy: {0}")]
    Policy(#[from] PolicyError),
    #[error("failed to open log file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to reopen log file {path}: {source}")]
    Reopen { path: PathBuf, source: io::Error },
    #[error("write to {path} failed: {source}")]
    Write { path: PathBuf, source: io::Error },
    /// The writer is in its terminal state (reopen failed, or it was
    /// closed). Every subsequent call returns this same error.
    #[error("log writer is unusable: {message}")]
    Terminal { message: String },
}

/// Non-fatal errors surfaced through the error sink rather than a `write`
/// result: the affected callers already received a successful return.
#[derive(Debug)]
pub enum ReportedError {
    /// Rotation aborted (e.g. the backup target already existed); the write
    /// proceeded against the oversized active file.
    Rotation(RotationError),
    /// A backup could not be compressed; the raw file is left in place.
    Compression { path: PathBuf, error: CompressError },
    /// The sweep could not list the log directory.
    Retention(RetentionError),
    /// A single expired backup could not be deleted; the sweep continued.
    RetentionDelete { path: PathBuf, error: io::Error },
}

/// Injectable sink for errors from rotation recovery and background tasks.
pub type ErrorSink = Arc<dyn Fn(&ReportedError) + Send + Sync>;

fn default_sink() -> ErrorSink {
    Arc::new(|error: &ReportedError| match error {
        ReportedError::Rotation(e) => {
            warn!(error = %e, "rotation aborted, writing past the size threshold");
        }
        ReportedError::Compression { path, error } => {
            warn!(path = %path.display(), error = %error, "backup compression failed");
        }
        ReportedError::Retention(e) => warn!(error = %e, "retention sweep failed"),
        ReportedError::RetentionDelete { path, error } => {
            warn!(path = %path.display(), error = %error, "failed to delete expired backup");
        }
    })
}

struct WriterCore {
    /// `None` only in the terminal state.
    active: Option<ActiveFile>,
    engine: RotationEngine,
    /// Set once; returned verbatim by every subsequent call.
    terminal: Option<String>,
}

/// A size-triggered rotating log writer.
///
/// Safe to share between threads (`write` takes `&self`); not designed for
/// multiple processes sharing one log path.
pub struct RotatingWriter {
    path: PathBuf,
    policy: RotationPolicy,
    core: Mutex<WriterCore>,
    sink: ErrorSink,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl RotatingWriter {
    /// Open a writer against `path` with the given policy.
    ///
    /// The active file is created if missing; if it already exists the size
    /// tracker is seeded from its on-disk size and sequence numbering
    /// continues from the highest existing backup.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> Result<Self, WriterError> {
        Self::with_error_sink(path, policy, default_sink())
    }

    /// Like [`RotatingWriter::open`], with a custom error sink replacing the
    /// default `tracing::warn!` reporting.
    pub fn with_error_sink(
        path: impl Into<PathBuf>,
        policy: RotationPolicy,
        sink: ErrorSink,
    ) -> Result<Self, WriterError> {
        let path = path.into();
        policy.validate()?;
        let active = ActiveFile::open(&path).map_err(|source| WriterError::Open {
            path: path.clone(),
            source,
        })?;
        let engine = RotationEngine::new(&path, policy.token_strategy).map_err(|source| {
            WriterError::Open {
                path: path.clone(),
                source,
            }
        })?;
        Ok(Self {
            core: Mutex::new(WriterCore {
                active: Some(active),
                engine,
                terminal: None,
            }),
            path,
            policy,
            sink,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Append `buf`, rotating first if the write would push the active file
    /// past the size threshold.
    ///
    /// A buffer is written whole: either every byte lands in one file
    /// generation or the call errors. A single write larger than the
    /// threshold still lands in one file rather than being split.
    pub fn write(&self, buf: &[u8]) -> Result<usize, WriterError> {
        let mut core = self.core.lock();

        if let Some(message) = &core.terminal {
            return Err(WriterError::Terminal {
                message: message.clone(),
            });
        }
        let Some(mut active) = core.active.take() else {
            let message = "active handle missing".to_string();
            core.terminal = Some(message.clone());
            return Err(WriterError::Terminal { message });
        };

        if RotationEngine::should_rotate(active.size(), buf.len(), self.policy.max_size_bytes) {
            match core.engine.rotate(active) {
                Ok(Rotation {
                    active: fresh,
                    backup,
                }) => {
                    active = fresh;
                    self.dispatch_background(backup);
                }
                Err(RotateFailure::Recovered {
                    active: restored,
                    error,
                }) => {
                    // Data beats tidiness: keep writing to the oversized
                    // file and let the caller's sink hear about it.
                    (self.sink)(&ReportedError::Rotation(error));
                    active = restored;
                }
                Err(RotateFailure::Fatal(error)) => {
                    core.terminal = Some(error.to_string());
                    return Err(match error {
                        RotationError::Reopen { path, source } => {
                            WriterError::Reopen { path, source }
                        }
                        other => WriterError::Terminal {
                            message: other.to_string(),
                        },
                    });
                }
            }
        }

        let result = active.write(buf);
        core.active = Some(active);
        result.map_err(|source| WriterError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Fsync the active handle.
    pub fn flush(&self) -> Result<(), WriterError> {
        let core = self.core.lock();
        match &core.active {
            Some(active) => active.sync().map_err(|source| WriterError::Write {
                path: active.path().to_owned(),
                source,
            }),
            None => Err(terminal_error(&core)),
        }
    }

    /// Flush and close the active handle.
    ///
    /// Does **not** wait for in-flight compression or retention; callers
    /// that need background work settled use
    /// [`RotatingWriter::wait_background`]. Writes after `close` fail with
    /// the terminal error.
    pub fn close(&self) -> Result<(), WriterError> {
        let mut core = self.core.lock();
        let Some(active) = core.active.take() else {
            return Err(terminal_error(&core));
        };
        core.terminal = Some("writer closed".to_string());
        let synced = active.sync();
        drop(active);
        synced.map_err(|source| WriterError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Block until every background compression/retention task spawned so
    /// far has finished. `close` deliberately does not do this.
    pub fn wait_background(&self) {
        let handles: Vec<_> = {
            let mut tasks = self.tasks.lock();
            tasks.drain(..).collect()
        };
        for handle in handles {
            if handle.join().is_err() {
                warn!("background task panicked");
            }
        }
    }

    /// Run a retention sweep inline and return its report.
    ///
    /// For count-limited policies where callers prefer deterministic
    /// cleanup over the fire-and-forget background sweep.
    pub fn sweep_now(&self) -> Result<SweepReport, RetentionError> {
        retention::sweep(&self.path, &self.policy, Utc::now())
    }

    /// Current byte size of the active file (seeded from disk on open).
    pub fn current_size(&self) -> u64 {
        self.core.lock().active.as_ref().map_or(0, ActiveFile::size)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Fire-and-forget compression and retention for a just-retired backup.
    /// Neither holds the writer mutex; writes to the new active file
    /// proceed concurrently.
    fn dispatch_background(&self, backup: PathBuf) {
        if self.policy.compress {
            let sink = Arc::clone(&self.sink);
            self.spawn(move || match compress::compress_backup(&backup) {
                Ok(CompressOutcome::Compressed { dest }) => {
                    debug!(path = %dest.display(), "backup compressed");
                }
                Ok(CompressOutcome::SourceMissing) => {}
                Err(error) => {
                    sink(&ReportedError::Compression {
                        path: backup,
                        error,
                    });
                }
            });
        }
        if self.policy.bounded() {
            let sink = Arc::clone(&self.sink);
            let base = self.path.clone();
            let policy = self.policy.clone();
            self.spawn(move || {
                report_sweep(retention::sweep(&base, &policy, Utc::now()), &sink);
            });
        }
    }

    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        let handle = thread::spawn(job);
        let mut tasks = self.tasks.lock();
        // Reap settled tasks so a long-lived writer does not accumulate
        // handles across thousands of rotations.
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }
}

fn terminal_error(core: &WriterCore) -> WriterError {
    WriterError::Terminal {
        message: core
            .terminal
            .clone()
            .unwrap_or_else(|| "writer closed".to_string()),
    }
}

fn report_sweep(result: Result<SweepReport, RetentionError>, sink: &ErrorSink) {
    match result {
        Ok(report) => {
            for (path, error) in report.errors {
                sink(&ReportedError::RetentionDelete { path, error });
            }
        }
        Err(error) => sink(&ReportedError::Retention(error)),
    }
}

impl io::Write for &RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::write(*self, buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        RotatingWriter::flush(*self).map_err(io::Error::other)
    }
}

impl io::Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut this = &*self;
        io::Write::write(&mut this, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut this = &*self;
        io::Write::flush(&mut this)
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
