// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Event classification, publish suppression and indicator routing.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::build::{BuildEvent, BuildEventRecord, BuildStatus, EventKind};
use crate::error::UnrecognizedKind;
use crate::indicator::command::IndicatorCommand;
use crate::indicator::task::IndicatorHandle;
use crate::settings::MonitorSettings;
use crate::DynResult;

pub type PublishFuture<'a> = Pin<Box<dyn Future<Output = DynResult<()>> + Send + 'a>>;

/// Forwards status changes onward. Fire-and-forget from the dispatcher's
/// point of view: errors are logged and dropped.
pub trait Publisher: Send + Sync {
    fn publish<'a>(
        &'a self,
        build_id: &'a str,
        build_name: &'a str,
        status: BuildStatus,
    ) -> PublishFuture<'a>;

    fn publish_quality_change<'a>(
        &'a self,
        build_id: &'a str,
        build_name: &'a str,
        quality: &'a str,
    ) -> PublishFuture<'a>;
}

/// A rendered local status line. `highlight` marks lines that should stand
/// out (failed builds); how that is shown is up to the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub text: String,
    pub highlight: bool,
}

/// Local sink used in place of the publisher while publishing is disabled.
pub trait StatusDisplay: Send + Sync {
    fn show(&self, line: &DisplayLine);
}

pub fn render_event(event: &BuildEvent) -> DisplayLine {
    let data = &event.data;
    let failed = data.status == BuildStatus::Failed;
    let text = match event.kind {
        EventKind::StatusChanged if failed => format!("Build {} failed!", data.build_name),
        EventKind::StatusChanged => {
            format!("Build [{}], status {}", data.build_name, data.status)
        }
        EventKind::QualityChanged => format!(
            "Build [{}], status {}, quality {}",
            data.build_name, data.status, data.quality
        ),
    };
    DisplayLine {
        text,
        highlight: failed,
    }
}

pub struct EventDispatcher {
    publisher: Box<dyn Publisher>,
    display: Box<dyn StatusDisplay>,
    indicator: IndicatorHandle,
    settings: watch::Receiver<MonitorSettings>,
}

impl EventDispatcher {
    pub fn new(
        publisher: Box<dyn Publisher>,
        display: Box<dyn StatusDisplay>,
        indicator: IndicatorHandle,
        settings: watch::Receiver<MonitorSettings>,
    ) -> Self {
        Self {
            publisher,
            display,
            indicator,
            settings,
        }
    }

    /// Classify a raw record and route it.
    ///
    /// Both the status path and the quality path run for every recognised
    /// event, then the indicator is driven from the status. The indicator is
    /// never suppressed. An unrecognised kind is returned before anything
    /// is published or shown.
    pub async fn dispatch(&self, record: BuildEventRecord) -> Result<(), UnrecognizedKind> {
        let event = BuildEvent::try_from(record)?;
        info!(
            "Build {} was requested for {}",
            event.data.build_name, event.data.requested_for
        );

        self.handle_status(&event).await;
        self.handle_quality(&event).await;
        self.drive_indicator(event.data.status).await;
        Ok(())
    }

    fn publish_disabled(&self) -> bool {
        self.settings.borrow().disable_publish
    }

    async fn handle_status(&self, event: &BuildEvent) {
        let data = &event.data;
        if self.publish_disabled() {
            info!("Publishing disabled, showing {} locally", data.build_name);
            self.display.show(&render_event(event));
            return;
        }
        if let Err(e) = self
            .publisher
            .publish(&data.build_id, &data.build_name, data.status)
            .await
        {
            warn!("Failed to publish status of {}: {}", data.build_name, e);
        }
    }

    async fn handle_quality(&self, event: &BuildEvent) {
        let data = &event.data;
        if self.publish_disabled() {
            self.display.show(&render_event(event));
            return;
        }
        if let Err(e) = self
            .publisher
            .publish_quality_change(&data.build_id, &data.build_name, &data.quality)
            .await
        {
            warn!("Failed to publish quality of {}: {}", data.build_name, e);
        }
    }

    async fn drive_indicator(&self, status: BuildStatus) {
        let Some(cmd) = IndicatorCommand::from_status(status) else {
            debug!("Status {} has no light pattern, indicator unchanged", status);
            return;
        };
        if let Err(e) = self.indicator.apply(cmd).await {
            warn!("Could not drive indicator with {}: {}", cmd, e);
        }
    }
}
