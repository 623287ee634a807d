// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fakes for the external collaborators, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::build::source::{EventSource, EventsFuture};
use crate::build::{BuildEventRecord, BuildStatus};
use crate::dispatch::{DisplayLine, PublishFuture, Publisher, StatusDisplay};
use crate::indicator::{Color, DeviceFuture, IndicatorState, Lamp, LightDevice};
use crate::DynResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    Open,
    Set(Color, Lamp, Instant),
    Close,
    Release,
}

#[derive(Debug, Default)]
struct DeviceLog {
    calls: Vec<DeviceCall>,
    lamps: IndicatorState,
    failing: bool,
}

/// Light device that records every call and tracks the lamps it was told
/// to show.
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    log: Arc<Mutex<DeviceLog>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().calls.clear();
    }

    /// Lamps as last acknowledged by the device.
    pub fn lamps(&self) -> IndicatorState {
        self.log.lock().unwrap().lamps
    }

    pub fn set_failing(&self, failing: bool) {
        self.log.lock().unwrap().failing = failing;
    }

    pub fn release_count(&self) -> usize {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, DeviceCall::Release))
            .count()
    }

    fn record(&self, call: DeviceCall) -> DynResult<()> {
        let mut log = self.log.lock().unwrap();
        log.calls.push(call);
        if log.failing {
            return Err("device not found".into());
        }
        if let DeviceCall::Set(color, lamp, _) = call {
            log.lamps.set_lamp(color, lamp);
        }
        Ok(())
    }
}

impl LightDevice for RecordingDevice {
    fn describe(&self) -> String {
        "recording".to_string()
    }

    fn open<'a>(&'a mut self) -> DeviceFuture<'a> {
        let result = self.record(DeviceCall::Open);
        Box::pin(async move { result })
    }

    fn set_lamp<'a>(&'a mut self, color: Color, lamp: Lamp) -> DeviceFuture<'a> {
        let result = self.record(DeviceCall::Set(color, lamp, Instant::now()));
        Box::pin(async move { result })
    }

    fn close<'a>(&'a mut self) -> DeviceFuture<'a> {
        let result = self.record(DeviceCall::Close);
        Box::pin(async move { result })
    }

    fn release<'a>(&'a mut self) -> DeviceFuture<'a> {
        let result = self.record(DeviceCall::Release);
        Box::pin(async move { result })
    }
}

/// One scripted response of a [`ScriptedSource`].
pub enum Fetch {
    Events(Vec<BuildEventRecord>),
    Fail(&'static str),
    Panic,
}

/// Event source replaying a script, one entry per fetch. Once the script is
/// exhausted every fetch returns no events.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Fetch>>>,
    fetches: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Fetch>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fetches: Arc::default(),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetches.lock().unwrap().clone()
    }
}

impl EventSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_events<'a>(&'a mut self) -> EventsFuture<'a> {
        self.fetches.lock().unwrap().push(Instant::now());
        let next = self.script.lock().unwrap().pop_front();
        Box::pin(async move {
            match next {
                Some(Fetch::Events(events)) => Ok(events),
                Some(Fetch::Fail(msg)) => Err(msg.into()),
                Some(Fetch::Panic) => panic!("scripted source panic"),
                None => Ok(Vec::new()),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    Status(String, String, BuildStatus),
    Quality(String, String, String),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<Published>>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }
}

impl Publisher for RecordingPublisher {
    fn publish<'a>(
        &'a self,
        build_id: &'a str,
        build_name: &'a str,
        status: BuildStatus,
    ) -> PublishFuture<'a> {
        self.published.lock().unwrap().push(Published::Status(
            build_id.to_string(),
            build_name.to_string(),
            status,
        ));
        Box::pin(async { Ok(()) })
    }

    fn publish_quality_change<'a>(
        &'a self,
        build_id: &'a str,
        build_name: &'a str,
        quality: &'a str,
    ) -> PublishFuture<'a> {
        self.published.lock().unwrap().push(Published::Quality(
            build_id.to_string(),
            build_name.to_string(),
            quality.to_string(),
        ));
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    lines: Arc<Mutex<Vec<DisplayLine>>>,
}

impl RecordingDisplay {
    pub fn lines(&self) -> Vec<DisplayLine> {
        self.lines.lock().unwrap().clone()
    }
}

impl StatusDisplay for RecordingDisplay {
    fn show(&self, line: &DisplayLine) {
        self.lines.lock().unwrap().push(line.clone());
    }
}
