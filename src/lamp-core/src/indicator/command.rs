// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::build::BuildStatus;

/// Build-status transitions the indicator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCommand {
    BuildFailed,
    BuildStarted,
    BuildStopped,
    BuildPartiallySucceeded,
    BuildInProgress,
    BuildNotStarted,
    BuildSucceeded,
}

impl IndicatorCommand {
    /// Map a build status onto its transition. `Unknown` has none.
    pub fn from_status(status: BuildStatus) -> Option<Self> {
        match status {
            BuildStatus::Failed => Some(Self::BuildFailed),
            BuildStatus::InProgress => Some(Self::BuildInProgress),
            BuildStatus::NotStarted => Some(Self::BuildNotStarted),
            BuildStatus::Succeeded => Some(Self::BuildSucceeded),
            BuildStatus::PartiallySucceeded => Some(Self::BuildPartiallySucceeded),
            BuildStatus::Stopped => Some(Self::BuildStopped),
            BuildStatus::Unknown => None,
        }
    }
}

impl fmt::Display for IndicatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BuildFailed => "OnBuildFailed",
            Self::BuildStarted => "OnBuildStarted",
            Self::BuildStopped => "OnBuildStopped",
            Self::BuildPartiallySucceeded => "OnBuildPartiallySucceeded",
            Self::BuildInProgress => "OnBuildInProgress",
            Self::BuildNotStarted => "OnBuildNotStarted",
            Self::BuildSucceeded => "OnBuildSucceeded",
        };
        f.write_str(name)
    }
}
