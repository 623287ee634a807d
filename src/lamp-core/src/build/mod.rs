// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Build events pulled from the CI server.
//!
//! Event sources hand out [`BuildEventRecord`]s whose `kind` is still the raw
//! string the producer used. The dispatcher classifies each record into a
//! [`BuildEvent`] with a closed [`EventKind`]; anything else is an
//! [`UnrecognizedKind`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::UnrecognizedKind;

pub mod source;

/// Execution status of a build as reported by the CI server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    NotStarted,
    InProgress,
    Succeeded,
    Failed,
    PartiallySucceeded,
    Stopped,
    #[default]
    Unknown,
}

impl BuildStatus {
    /// Parse a CI status string, ignoring case and separators.
    ///
    /// Text this system does not know maps to [`BuildStatus::Unknown`].
    pub fn parse(s: &str) -> Self {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "notstarted" | "none" | "postponed" => Self::NotStarted,
            "inprogress" | "cancelling" => Self::InProgress,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "partiallysucceeded" => Self::PartiallySucceeded,
            "stopped" | "canceled" | "cancelled" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// Resolve a build's status from the CI `result` (set once the build
    /// completed) falling back to its live `status`.
    pub fn from_result_or_status(result: Option<&str>, status: Option<&str>) -> Self {
        result
            .or(status)
            .map(Self::parse)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::PartiallySucceeded => "PartiallySucceeded",
            Self::Stopped => "Stopped",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BuildStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// What a build event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StatusChanged,
    QualityChanged,
}

impl FromStr for EventKind {
    type Err = UnrecognizedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "build" | "statuschanged" => Ok(Self::StatusChanged),
            "qualitychanged" => Ok(Self::QualityChanged),
            _ => Err(UnrecognizedKind(s.to_string())),
        }
    }
}

/// Payload shared by every build event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildData {
    pub build_id: String,
    pub build_name: String,
    #[serde(default)]
    pub status: BuildStatus,
    /// Free-form build quality; empty when the producer has none.
    #[serde(default)]
    pub quality: String,
    /// Display name of whoever triggered the build.
    #[serde(default)]
    pub requested_for: String,
}

/// Unclassified event as produced by an event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEventRecord {
    pub kind: String,
    #[serde(flatten)]
    pub data: BuildData,
}

impl BuildEventRecord {
    pub fn status_changed(
        build_id: impl Into<String>,
        build_name: impl Into<String>,
        status: BuildStatus,
    ) -> Self {
        Self {
            kind: "status_changed".to_string(),
            data: BuildData {
                build_id: build_id.into(),
                build_name: build_name.into(),
                status,
                quality: String::new(),
                requested_for: String::new(),
            },
        }
    }
}

/// Classified build event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildEvent {
    pub kind: EventKind,
    pub data: BuildData,
}

impl TryFrom<BuildEventRecord> for BuildEvent {
    type Error = UnrecognizedKind;

    fn try_from(record: BuildEventRecord) -> Result<Self, Self::Error> {
        let kind = record.kind.parse::<EventKind>()?;
        Ok(Self {
            kind,
            data: record.data,
        })
    }
}
