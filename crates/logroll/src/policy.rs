// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotation policy: immutable configuration for a rotating writer.

use crate::token::TokenStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Policy validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("max_size_bytes must be > 0")]
    ZeroMaxSize,
    #[error("max_backups must be > 0 when set")]
    ZeroMaxBackups,
    #[error("max_age must be > 0 when set")]
    ZeroMaxAge,
    #[error("max_age requires the timestamp token strategy")]
    AgeNeedsTimestamp,
}

/// Immutable rotation configuration.
///
/// Supplied at construction and never mutated afterward; a writer that needs
/// a different policy is reconstructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    /// Size threshold in bytes. A write that would push a non-empty active
    /// file past this triggers a rotation first.
    pub max_size_bytes: u64,
    /// Upper bound on retained backups; `None` means unlimited.
    pub max_backups: Option<usize>,
    /// Age bound on retained backups, judged by the token's implied
    /// timestamp. Requires [`TokenStrategy::Timestamp`].
    pub max_age: Option<Duration>,
    /// Gzip retired backups on a background thread.
    pub compress: bool,
    /// How backup suffixes are generated.
    pub token_strategy: TokenStrategy,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: 64 * 1024 * 1024, // 64 MB
            max_backups: None,
            max_age: None,
            compress: false,
            token_strategy: TokenStrategy::Sequence,
        }
    }
}

impl RotationPolicy {
    /// Policy with the given size threshold and defaults elsewhere.
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            max_size_bytes,
            ..Self::default()
        }
    }

    pub fn with_max_backups(mut self, max: usize) -> Self {
        self.max_backups = Some(max);
        self
    }

    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    pub fn with_compress(mut self, on: bool) -> Self {
        self.compress = on;
        self
    }

    pub fn with_token_strategy(mut self, strategy: TokenStrategy) -> Self {
        self.token_strategy = strategy;
        self
    }

    /// Whether any retention bound is configured.
    pub fn bounded(&self) -> bool {
        self.max_backups.is_some() || self.max_age.is_some()
    }

    /// Validate configuration constraints.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_size_bytes == 0 {
            return Err(PolicyError::ZeroMaxSize);
        }
        if self.max_backups == Some(0) {
            return Err(PolicyError::ZeroMaxBackups);
        }
        if let Some(age) = self.max_age {
            if age.is_zero() {
                return Err(PolicyError::ZeroMaxAge);
            }
            if self.token_strategy != TokenStrategy::Timestamp {
                return Err(PolicyError::AgeNeedsTimestamp);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
