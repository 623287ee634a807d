// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod build;
pub mod dispatch;
pub mod error;
pub mod indicator;
pub mod scheduler;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use build::source::EventSource;
pub use build::{BuildData, BuildEvent, BuildEventRecord, BuildStatus, EventKind};
pub use dispatch::{DisplayLine, EventDispatcher, Publisher, StatusDisplay};
pub use error::{CycleError, IndicatorError, SettingsError, UnrecognizedKind};
pub use indicator::command::IndicatorCommand;
pub use indicator::machine::IndicatorStateMachine;
pub use indicator::task::{spawn_indicator, IndicatorHandle, IndicatorOp, IndicatorRequest};
pub use indicator::{Color, IndicatorState, Lamp, LightDevice};
pub use scheduler::{CycleStats, PollingScheduler};
pub use settings::{MonitorSettings, StoppedOutcome};
