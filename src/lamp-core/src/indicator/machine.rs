// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Indicator state machine.
//!
//! Translates build-status transitions into lamp patterns. Colours are
//! exclusive: a transition first turns the other colours off, then lights the
//! target. The one exception is a stopped build, which flashes the last
//! steady colour on top of whatever is lit, waits, and then settles.
//!
//! Device failures never leave this module. Each lamp change is a separate
//! open/set/close round trip whose errors are logged; the logical state is
//! updated either way so later transitions replay what was intended.


use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info};

use crate::build::BuildStatus;
use crate::indicator::command::IndicatorCommand;
use crate::indicator::{Color, IndicatorState, Lamp, LightDevice};
use crate::settings::{MonitorSettings, StoppedOutcome};
use crate::DynResult;

pub struct IndicatorStateMachine {
    device: Box<dyn LightDevice>,
    settings: watch::Receiver<MonitorSettings>,
    state: IndicatorState,
    shut_down: bool,
    transition_count: u64,
}

impl IndicatorStateMachine {
    /// Create a machine with every lamp logically off. Nothing is sent to the
    /// device until [`IndicatorStateMachine::power_on`].
    pub fn new(device: Box<dyn LightDevice>, settings: watch::Receiver<MonitorSettings>) -> Self {
        Self {
            device,
            settings,
            state: IndicatorState::default(),
            shut_down: false,
            transition_count: 0,
        }
    }

    pub fn state(&self) -> &IndicatorState {
        &self.state
    }

    /// Force every lamp off, then flash blue until the first build status
    /// arrives.
    pub async fn power_on(&mut self) {
        info!("Indicator online ({})", self.device.describe());
        for color in Color::ALL {
            self.drive(color, Lamp::Off).await;
        }
        self.show(Color::Blue, Lamp::Flashing).await;
    }

    /// Apply the transition for a build status. `Unknown` leaves the light
    /// untouched.
    pub async fn apply_status(&mut self, status: BuildStatus) {
        match IndicatorCommand::from_status(status) {
            Some(cmd) => self.apply(cmd).await,
            None => debug!("No indicator transition for status {}", status),
        }
    }

    /// Apply a transition.
    ///
    /// A stopped build holds the caller for the whole replay flash.
    pub async fn apply(&mut self, cmd: IndicatorCommand) {
        if self.shut_down {
            debug!("Indicator shut down, ignoring {}", cmd);
            return;
        }
        debug!("Indicator {}", cmd);
        match cmd {
            IndicatorCommand::BuildFailed => self.show_steady(Color::Red).await,
            IndicatorCommand::BuildStarted
            | IndicatorCommand::BuildInProgress
            | IndicatorCommand::BuildNotStarted => self.show_steady(Color::Blue).await,
            IndicatorCommand::BuildSucceeded => self.show_steady(Color::Green).await,
            IndicatorCommand::BuildPartiallySucceeded => {
                self.show(Color::Green, Lamp::Flashing).await
            }
            IndicatorCommand::BuildStopped => self.replay_last_steady().await,
        }
        self.transition_count += 1;
    }

    /// Turn every lamp off and release the device. Safe to call repeatedly.
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        for color in Color::ALL {
            self.drive(color, Lamp::Off).await;
        }
        if let Err(e) = self.device.release().await {
            error!("Light device release failed: {}", e);
        }
        self.shut_down = true;
        info!(
            "Indicator shut down after {} transition(s)",
            self.transition_count
        );
    }

    async fn show_steady(&mut self, color: Color) {
        self.show(color, Lamp::Steady).await;
        self.state.last_steady = Some(color);
    }

    async fn show(&mut self, color: Color, lamp: Lamp) {
        for other in Color::ALL.into_iter().filter(|c| *c != color) {
            self.drive(other, Lamp::Off).await;
        }
        self.drive(color, lamp).await;
    }

    async fn replay_last_steady(&mut self) {
        let (flash, outcome) = {
            let settings = self.settings.borrow();
            (settings.stopped_flash(), settings.stopped_outcome)
        };
        let Some(color) = self.state.last_steady else {
            debug!("Build stopped with no steady colour to replay");
            for color in Color::ALL {
                self.drive(color, Lamp::Off).await;
            }
            return;
        };

        self.drive(color, Lamp::Flashing).await;
        time::sleep(flash).await;
        match outcome {
            StoppedOutcome::Off => {
                for color in Color::ALL {
                    self.drive(color, Lamp::Off).await;
                }
            }
            StoppedOutcome::Restore => self.show(color, Lamp::Steady).await,
        }
    }

    async fn drive(&mut self, color: Color, lamp: Lamp) {
        self.state.set_lamp(color, lamp);
        if let Err(e) = self.drive_device(color, lamp).await {
            error!(
                "Light device communication failed ({} {:?}): {}",
                color, lamp, e
            );
        }
    }

    async fn drive_device(&mut self, color: Color, lamp: Lamp) -> DynResult<()> {
        self.device.open().await?;
        let result = self.device.set_lamp(color, lamp).await;
        let closed = self.device.close().await;
        result?;
        closed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{DeviceCall, RecordingDevice};

    fn machine_with(settings: MonitorSettings) -> (IndicatorStateMachine, RecordingDevice) {
        let device = RecordingDevice::new();
        let (_tx, rx) = watch::channel(settings);
        (
            IndicatorStateMachine::new(Box::new(device.clone()), rx),
            device,
        )
    }

    fn machine() -> (IndicatorStateMachine, RecordingDevice) {
        machine_with(MonitorSettings::default())
    }

    #[tokio::test]
    async fn test_power_on_flashes_blue() {
        let (mut machine, device) = machine();
        machine.power_on().await;

        assert_eq!(machine.state().blue, Lamp::Flashing);
        assert_eq!(machine.state().lit_colors(), vec![Color::Blue]);
        assert_eq!(machine.state().last_steady, None);
        assert_eq!(device.lamps().blue, Lamp::Flashing);
    }

    #[tokio::test]
    async fn test_status_transition_table() {
        let cases = [
            (BuildStatus::Failed, Color::Red, Lamp::Steady),
            (BuildStatus::InProgress, Color::Blue, Lamp::Steady),
            (BuildStatus::NotStarted, Color::Blue, Lamp::Steady),
            (BuildStatus::Succeeded, Color::Green, Lamp::Steady),
            (BuildStatus::PartiallySucceeded, Color::Green, Lamp::Flashing),
        ];
        for (status, color, lamp) in cases {
            let (mut machine, device) = machine();
            machine.power_on().await;
            machine.apply_status(status).await;
            assert_eq!(machine.state().lit_colors(), vec![color], "{status}");
            assert_eq!(machine.state().lamp(color), lamp, "{status}");
            assert_eq!(device.lamps().lamp(color), lamp, "{status}");
        }
    }

    #[tokio::test]
    async fn test_inactive_colors_cleared_before_target() {
        let (mut machine, device) = machine();
        machine.apply(IndicatorCommand::BuildSucceeded).await;
        device.clear_calls();

        machine.apply(IndicatorCommand::BuildFailed).await;

        let sets: Vec<(Color, Lamp)> = device
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Set(color, lamp, _) => Some((color, lamp)),
                _ => None,
            })
            .collect();
        assert_eq!(
            sets,
            vec![
                (Color::Green, Lamp::Off),
                (Color::Blue, Lamp::Off),
                (Color::Red, Lamp::Steady),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_colors_stay_exclusive() {
        let (mut machine, _device) = machine();
        machine.power_on().await;
        let sequence = [
            BuildStatus::InProgress,
            BuildStatus::Failed,
            BuildStatus::PartiallySucceeded,
            BuildStatus::Unknown,
            BuildStatus::Succeeded,
            BuildStatus::Stopped,
            BuildStatus::NotStarted,
            BuildStatus::Failed,
            BuildStatus::Stopped,
            BuildStatus::PartiallySucceeded,
        ];
        for status in sequence {
            machine.apply_status(status).await;
            assert!(
                machine.state().lit_colors().len() <= 1,
                "after {status}: {:?}",
                machine.state()
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_replays_last_steady_color() {
        for (status, color) in [
            (BuildStatus::Succeeded, Color::Green),
            (BuildStatus::Failed, Color::Red),
        ] {
            let (mut machine, device) = machine();
            machine.apply_status(status).await;
            device.clear_calls();

            machine.apply_status(BuildStatus::Stopped).await;

            let first = device.calls().into_iter().find_map(|call| match call {
                DeviceCall::Set(c, lamp, _) => Some((c, lamp)),
                _ => None,
            });
            assert_eq!(first, Some((color, Lamp::Flashing)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_flashes_for_duration_then_goes_dark() {
        let (mut machine, device) = machine();
        machine.apply_status(BuildStatus::Succeeded).await;
        device.clear_calls();

        let started = time::Instant::now();
        machine.apply_status(BuildStatus::Stopped).await;
        assert_eq!(started.elapsed(), Duration::from_secs(15));

        let sets: Vec<(Color, Lamp, time::Instant)> = device
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Set(color, lamp, at) => Some((color, lamp, at)),
                _ => None,
            })
            .collect();
        let (_, _, flash_at) = sets
            .iter()
            .find(|(c, l, _)| *c == Color::Green && *l == Lamp::Flashing)
            .copied()
            .unwrap();
        let (_, _, off_at) = sets
            .iter()
            .find(|(c, l, _)| *c == Color::Green && *l == Lamp::Off)
            .copied()
            .unwrap();
        assert_eq!(off_at - flash_at, Duration::from_secs(15));
        assert!(machine.state().is_dark());
        assert!(device.lamps().is_dark());
        assert_eq!(machine.state().last_steady, Some(Color::Green));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_restore_outcome_leaves_color_on() {
        let (mut machine, _device) = machine_with(MonitorSettings {
            stopped_outcome: StoppedOutcome::Restore,
            stopped_flash_secs: 3,
            ..MonitorSettings::default()
        });
        machine.apply_status(BuildStatus::Failed).await;

        let started = time::Instant::now();
        machine.apply_status(BuildStatus::Stopped).await;

        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert_eq!(machine.state().lit_colors(), vec![Color::Red]);
        assert_eq!(machine.state().red, Lamp::Steady);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_does_not_overwrite_last_steady() {
        let (mut machine, device) = machine();
        machine.apply_status(BuildStatus::Failed).await;
        machine.apply_status(BuildStatus::PartiallySucceeded).await;
        machine.apply_status(BuildStatus::Stopped).await;
        assert_eq!(machine.state().last_steady, Some(Color::Red));

        device.clear_calls();
        machine.apply_status(BuildStatus::Stopped).await;
        let first = device.calls().into_iter().find_map(|call| match call {
            DeviceCall::Set(c, lamp, _) => Some((c, lamp)),
            _ => None,
        });
        assert_eq!(first, Some((Color::Red, Lamp::Flashing)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_without_history_goes_dark_immediately() {
        let (mut machine, _device) = machine();
        machine.power_on().await;

        let started = time::Instant::now();
        machine.apply_status(BuildStatus::Stopped).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(machine.state().is_dark());
    }

    #[tokio::test]
    async fn test_device_failure_keeps_bookkeeping() {
        let (mut machine, device) = machine();
        device.set_failing(true);

        machine.apply_status(BuildStatus::Failed).await;

        assert_eq!(machine.state().red, Lamp::Steady);
        assert_eq!(machine.state().last_steady, Some(Color::Red));
        assert_eq!(machine.transition_count, 1);
        assert!(device.lamps().is_dark());
    }

    #[tokio::test]
    async fn test_every_lamp_change_is_bracketed_by_open_and_close() {
        let (mut machine, device) = machine();
        machine.apply_status(BuildStatus::Succeeded).await;

        let calls = device.calls();
        assert_eq!(calls.len(), 9);
        for chunk in calls.chunks(3) {
            assert!(matches!(chunk[0], DeviceCall::Open));
            assert!(matches!(chunk[1], DeviceCall::Set(..)));
            assert!(matches!(chunk[2], DeviceCall::Close));
        }
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (mut machine, device) = machine();
        machine.apply_status(BuildStatus::Failed).await;

        machine.shutdown().await;
        machine.shutdown().await;

        assert!(machine.shut_down);
        assert!(machine.state().is_dark());
        assert_eq!(device.release_count(), 1);

        machine.apply_status(BuildStatus::Succeeded).await;
        assert!(machine.state().is_dark());
    }
}
