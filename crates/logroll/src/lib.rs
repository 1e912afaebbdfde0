// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! logroll: a size-triggered rotating log writer.
//!
//! Callers hand [`RotatingWriter`] opaque byte slices. Once a write would
//! push the active file past its size threshold, the file is rolled over to
//! a token-suffixed backup (close → rename → reopen), optionally
//! gzip-compressed off the write path, and a retention sweep bounds how
//! many backups stay on disk.
//!
//! Designed for many threads sharing one writer within a single process; a
//! log path is never coordinated across processes.
//!
//! ```no_run
//! use logroll::{RotatingWriter, RotationPolicy};
//!
//! # fn main() -> Result<(), logroll::WriterError> {
//! let writer = RotatingWriter::open(
//!     "app.log",
//!     RotationPolicy::new(10 * 1024 * 1024)
//!         .with_max_backups(5)
//!         .with_compress(true),
//! )?;
//! writer.write(b"hello\n")?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

mod active;
mod compress;
mod policy;
mod retention;
mod rotation;
mod token;
mod writer;

pub use compress::CompressError;
pub use policy::{PolicyError, RotationPolicy};
pub use retention::{RetentionError, SweepReport};
pub use rotation::RotationError;
pub use token::{RotationToken, TokenStrategy};
pub use writer::{ErrorSink, ReportedError, RotatingWriter, WriterError};
