// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Error taxonomy of the monitoring core.
//!
//! Collaborator plumbing (event sources, publishers, light devices) reports
//! failures as [`crate::DynResult`]; the variants below are the conditions the
//! core itself distinguishes.

use thiserror::Error;

/// A raw build event carried a kind this system does not handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event was not recognised (kind '{0}')")]
pub struct UnrecognizedKind(pub String);

/// Why a poll cycle was aborted.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("event source unavailable: {0}")]
    SourceUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Classification(#[from] UnrecognizedKind),
}

/// Invalid live setting, detected at the point of use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("poll period must be > 0 seconds (got {0})")]
    InvalidPollPeriod(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("indicator task is not running")]
    Unavailable,
}
