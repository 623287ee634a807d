// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Indicator task.
//!
//! The state machine lives on exactly one task. Everybody else talks to it
//! through an [`IndicatorHandle`]; requests queue on the channel and are
//! applied one at a time, so a caller arriving during a replay flash waits
//! for the flash to finish.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::IndicatorError;
use crate::indicator::command::IndicatorCommand;
use crate::indicator::machine::IndicatorStateMachine;
use crate::indicator::{IndicatorState, LightDevice};
use crate::settings::MonitorSettings;

const INDICATOR_CHANNEL_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorOp {
    Apply(IndicatorCommand),
    Snapshot,
    Shutdown,
}

/// Request sent to the indicator task. The reply is the state after the
/// operation completed.
#[derive(Debug)]
pub struct IndicatorRequest {
    pub op: IndicatorOp,
    pub respond_to: oneshot::Sender<IndicatorState>,
}

#[derive(Debug, Clone)]
pub struct IndicatorHandle {
    tx: mpsc::Sender<IndicatorRequest>,
}

impl IndicatorHandle {
    pub fn new(tx: mpsc::Sender<IndicatorRequest>) -> Self {
        Self { tx }
    }

    /// Apply a transition and wait until the light has settled.
    pub async fn apply(&self, cmd: IndicatorCommand) -> Result<IndicatorState, IndicatorError> {
        self.request(IndicatorOp::Apply(cmd)).await
    }

    pub async fn snapshot(&self) -> Result<IndicatorState, IndicatorError> {
        self.request(IndicatorOp::Snapshot).await
    }

    pub async fn shutdown(&self) -> Result<IndicatorState, IndicatorError> {
        self.request(IndicatorOp::Shutdown).await
    }

    async fn request(&self, op: IndicatorOp) -> Result<IndicatorState, IndicatorError> {
        let (respond_to, rx) = oneshot::channel();
        self.tx
            .send(IndicatorRequest { op, respond_to })
            .await
            .map_err(|_| IndicatorError::Unavailable)?;
        rx.await.map_err(|_| IndicatorError::Unavailable)
    }
}

/// Build the state machine and spawn its task.
pub fn spawn_indicator(
    device: Box<dyn LightDevice>,
    settings: watch::Receiver<MonitorSettings>,
) -> (IndicatorHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(INDICATOR_CHANNEL_BUFFER);
    let machine = IndicatorStateMachine::new(device, settings);
    let task = tokio::spawn(run_indicator_task(machine, rx));
    (IndicatorHandle::new(tx), task)
}

/// Power the light on, then serve requests until every handle is dropped.
/// The light is shut down on the way out.
pub async fn run_indicator_task(
    mut machine: IndicatorStateMachine,
    mut rx: mpsc::Receiver<IndicatorRequest>,
) {
    machine.power_on().await;

    while let Some(IndicatorRequest { op, respond_to }) = rx.recv().await {
        match op {
            IndicatorOp::Apply(cmd) => machine.apply(cmd).await,
            IndicatorOp::Snapshot => {}
            IndicatorOp::Shutdown => machine.shutdown().await,
        }
        if respond_to.send(*machine.state()).is_err() {
            warn!("Indicator caller went away before {:?} completed", op);
        }
    }

    machine.shutdown().await;
    info!("Indicator task shutting down (channel closed)");
}
