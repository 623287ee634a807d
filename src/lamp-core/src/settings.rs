// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Live monitor settings.
//!
//! The server publishes a [`MonitorSettings`] snapshot on a
//! `tokio::sync::watch` channel. Components keep a receiver and read it at
//! every point of use, so a reloaded configuration takes effect on the next
//! cycle or event without restarting anything.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// What the light does once the replay flash of a stopped build ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppedOutcome {
    /// Turn every lamp off.
    #[default]
    Off,
    /// Leave the replayed colour on steady.
    Restore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Delay between the end of one poll cycle and the start of the next.
    pub poll_period_secs: u64,
    /// Render events locally instead of forwarding them to the publisher.
    pub disable_publish: bool,
    /// How long a stopped build replays the last steady colour.
    pub stopped_flash_secs: u64,
    pub stopped_outcome: StoppedOutcome,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_period_secs: 30,
            disable_publish: false,
            stopped_flash_secs: 15,
            stopped_outcome: StoppedOutcome::Off,
        }
    }
}

impl MonitorSettings {
    pub fn poll_period(&self) -> Result<Duration, SettingsError> {
        if self.poll_period_secs == 0 {
            return Err(SettingsError::InvalidPollPeriod(self.poll_period_secs));
        }
        Ok(Duration::from_secs(self.poll_period_secs))
    }

    pub fn stopped_flash(&self) -> Duration {
        Duration::from_secs(self.stopped_flash_secs)
    }
}
