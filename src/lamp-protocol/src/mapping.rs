// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Mapping between wire commands and indicator transitions.

use lamp_core::IndicatorCommand;

use crate::types::ClientCommand;

/// The indicator transition a client command asks for.
///
/// `publish` maps through its status, so a remote publisher drives this
/// light the same way a local dispatch would. Commands that do not touch
/// the light (`get_state`, quality changes, `publish` with an unknown
/// status) map to `None`.
pub fn client_command_to_indicator(cmd: &ClientCommand) -> Option<IndicatorCommand> {
    match cmd {
        ClientCommand::OnBuildFailed => Some(IndicatorCommand::BuildFailed),
        ClientCommand::OnBuildStarted => Some(IndicatorCommand::BuildStarted),
        ClientCommand::OnBuildStopped => Some(IndicatorCommand::BuildStopped),
        ClientCommand::OnBuildPartiallySucceeded => Some(IndicatorCommand::BuildPartiallySucceeded),
        ClientCommand::OnBuildInProgress => Some(IndicatorCommand::BuildInProgress),
        ClientCommand::OnBuildNotStarted => Some(IndicatorCommand::BuildNotStarted),
        ClientCommand::OnBuildSucceeded => Some(IndicatorCommand::BuildSucceeded),
        ClientCommand::Publish { status, .. } => IndicatorCommand::from_status(*status),
        ClientCommand::PublishQualityChange { .. } | ClientCommand::GetState => None,
    }
}
