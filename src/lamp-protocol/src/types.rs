// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Transport DTOs for the JSON line protocol.

use serde::{Deserialize, Serialize};

use lamp_core::{BuildStatus, IndicatorState};

/// Command received from network clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    OnBuildFailed,
    OnBuildStarted,
    OnBuildStopped,
    OnBuildPartiallySucceeded,
    OnBuildInProgress,
    OnBuildNotStarted,
    OnBuildSucceeded,
    Publish {
        build_id: String,
        build_name: String,
        status: BuildStatus,
    },
    PublishQualityChange {
        build_id: String,
        build_name: String,
        #[serde(default)]
        quality: String,
    },
    GetState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub cmd: ClientCommand,
}

impl ClientEnvelope {
    pub fn new(token: Option<String>, cmd: ClientCommand) -> Self {
        Self { token, cmd }
    }
}

/// Response sent back over TCP. `state` is the light after the command ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<IndicatorState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClientResponse {
    pub fn ok(state: IndicatorState) -> Self {
        Self {
            success: true,
            state: Some(state),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            state: None,
            error: Some(message.into()),
        }
    }
}
