// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Self-rescheduling poll loop.
//!
//! A cycle fetches the current events from the source and dispatches them
//! in order. The next cycle is only scheduled once the previous one has
//! finished, so at most one cycle is ever in flight. Every cycle runs as its
//! own task; a failure or a panic inside it is logged and the loop carries
//! on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::build::source::EventSource;
use crate::dispatch::EventDispatcher;
use crate::error::CycleError;
use crate::settings::MonitorSettings;

/// Added to every poll period before the next cycle starts.
pub const SETTLE_TIME: Duration = Duration::from_secs(1);
/// Used until a valid poll period has been read.
pub const FALLBACK_POLL_PERIOD: Duration = Duration::from_secs(30);

/// One fetch-and-dispatch pass.
pub struct CycleRunner {
    source: Box<dyn EventSource>,
    dispatcher: EventDispatcher,
}

impl CycleRunner {
    pub fn new(source: Box<dyn EventSource>, dispatcher: EventDispatcher) -> Self {
        Self { source, dispatcher }
    }

    /// Returns the number of events dispatched. The first unrecognised
    /// event aborts the rest of the batch.
    pub async fn run_cycle(&mut self) -> Result<usize, CycleError> {
        debug!("Polling {}", self.source.name());
        let records = self
            .source
            .fetch_events()
            .await
            .map_err(CycleError::SourceUnavailable)?;

        let mut dispatched = 0;
        for record in records {
            self.dispatcher.dispatch(record).await?;
            dispatched += 1;
        }
        Ok(dispatched)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub completed: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
}

struct Running {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct PollingScheduler {
    runner: Arc<Mutex<CycleRunner>>,
    settings: watch::Receiver<MonitorSettings>,
    counters: Arc<Counters>,
    running: Option<Running>,
}

impl PollingScheduler {
    pub fn new(
        source: Box<dyn EventSource>,
        dispatcher: EventDispatcher,
        settings: watch::Receiver<MonitorSettings>,
    ) -> Self {
        Self {
            runner: Arc::new(Mutex::new(CycleRunner::new(source, dispatcher))),
            settings,
            counters: Arc::default(),
            running: None,
        }
    }

    /// Start polling; the first cycle runs immediately. Returns `false` if
    /// the loop was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_scheduler(
            self.runner.clone(),
            self.settings.clone(),
            self.counters.clone(),
            stop_rx,
        ));
        self.running = Some(Running { stop_tx, task });
        true
    }

    /// Cancel the pending cycle. A cycle already in flight finishes; the
    /// returned handle resolves once the loop has exited.
    pub fn stop(&mut self) -> Option<JoinHandle<()>> {
        let Running { stop_tx, task } = self.running.take()?;
        let _ = stop_tx.send(true);
        Some(task)
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    pub fn stats(&self) -> CycleStats {
        CycleStats {
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

async fn run_scheduler(
    runner: Arc<Mutex<CycleRunner>>,
    settings: watch::Receiver<MonitorSettings>,
    counters: Arc<Counters>,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!("Polling scheduler started");
    let mut period = FALLBACK_POLL_PERIOD;

    loop {
        let cycle_runner = runner.clone();
        let cycle = tokio::spawn(async move { cycle_runner.lock().await.run_cycle().await });
        match cycle.await {
            Ok(Ok(count)) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                debug!("Poll cycle finished, {} event(s) dispatched", count);
            }
            Ok(Err(e)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!("Poll cycle failed: {}", e);
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!("Poll cycle aborted: {}", e);
            }
        }

        if *stop_rx.borrow() {
            break;
        }

        let configured = settings.borrow().poll_period();
        match configured {
            Ok(p) => period = p,
            Err(e) => warn!("{}, keeping {}s", e, period.as_secs()),
        }

        tokio::select! {
            _ = time::sleep(period + SETTLE_TIME) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Polling scheduler stopped");
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::build::{BuildEventRecord, BuildStatus};
    use crate::indicator::task::{spawn_indicator, IndicatorHandle};
    use crate::indicator::Color;
    use crate::testing::{
        Fetch, Published, RecordingDevice, RecordingDisplay, RecordingPublisher, ScriptedSource,
    };

    struct Harness {
        scheduler: PollingScheduler,
        source: ScriptedSource,
        publisher: RecordingPublisher,
        indicator: IndicatorHandle,
        settings: watch::Sender<MonitorSettings>,
    }

    fn harness(poll_period_secs: u64, script: Vec<Fetch>) -> Harness {
        let (settings, rx) = watch::channel(MonitorSettings {
            poll_period_secs,
            ..MonitorSettings::default()
        });
        let (indicator, _task) = spawn_indicator(Box::new(RecordingDevice::new()), rx.clone());
        let publisher = RecordingPublisher::default();
        let dispatcher = EventDispatcher::new(
            Box::new(publisher.clone()),
            Box::new(RecordingDisplay::default()),
            indicator.clone(),
            rx.clone(),
        );
        let source = ScriptedSource::new(script);
        let scheduler = PollingScheduler::new(Box::new(source.clone()), dispatcher, rx);
        Harness {
            scheduler,
            source,
            publisher,
            indicator,
            settings,
        }
    }

    fn offsets(start: Instant, times: &[Instant]) -> Vec<u64> {
        times.iter().map(|t| (*t - start).as_secs()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_immediate_then_period_plus_settle() {
        let mut h = harness(5, vec![]);
        let start = Instant::now();
        assert!(h.scheduler.start());
        assert!(!h.scheduler.start());

        time::sleep(Duration::from_secs(13)).await;
        assert_eq!(offsets(start, &h.source.fetch_times()), vec![0, 6, 12]);
        assert_eq!(h.scheduler.stats().completed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_does_not_stop_next_cycle() {
        let mut h = harness(
            5,
            vec![
                Fetch::Fail("server unreachable"),
                Fetch::Events(vec![BuildEventRecord::status_changed(
                    "1",
                    "CI",
                    BuildStatus::Succeeded,
                )]),
            ],
        );
        h.scheduler.start();
        time::sleep(Duration::from_secs(7)).await;

        assert_eq!(
            h.scheduler.stats(),
            CycleStats {
                completed: 1,
                failed: 1
            }
        );
        let state = h.indicator.snapshot().await.unwrap();
        assert_eq!(state.lit_colors(), vec![Color::Green]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecognized_kind_aborts_rest_of_batch() {
        let mut bad = BuildEventRecord::status_changed("2", "bad", BuildStatus::Failed);
        bad.kind = "build_deleted".to_string();
        let mut quality = BuildEventRecord::status_changed("3", "late", BuildStatus::Failed);
        quality.kind = "quality_changed".to_string();

        let mut h = harness(
            5,
            vec![Fetch::Events(vec![
                BuildEventRecord::status_changed("1", "first", BuildStatus::Succeeded),
                bad,
                quality,
            ])],
        );
        h.scheduler.start();
        time::sleep(Duration::from_secs(1)).await;

        let published = h.publisher.published();
        assert_eq!(published.len(), 2);
        assert!(published.iter().all(|p| match p {
            Published::Status(id, _, _) | Published::Quality(id, _, _) => id == "1",
        }));
        assert_eq!(h.scheduler.stats().failed, 1);
        let state = h.indicator.snapshot().await.unwrap();
        assert_eq!(state.lit_colors(), vec![Color::Green]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_cycle() {
        let mut h = harness(5, vec![]);
        h.scheduler.start();
        time::sleep(Duration::from_secs(2)).await;

        let task = h.scheduler.stop().unwrap();
        task.await.unwrap();
        assert!(!h.scheduler.is_running());
        assert!(h.scheduler.stop().is_none());

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.source.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_in_flight_cycle_finish() {
        let mut h = harness(
            5,
            vec![Fetch::Events(vec![
                BuildEventRecord::status_changed("1", "CI", BuildStatus::Succeeded),
                BuildEventRecord::status_changed("2", "CI", BuildStatus::Stopped),
            ])],
        );
        let start = Instant::now();
        h.scheduler.start();
        time::sleep(Duration::from_secs(2)).await;

        // The stopped flash is still running.
        let task = h.scheduler.stop().unwrap();
        task.await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(15));
        assert_eq!(h.scheduler.stats().completed, 1);

        let state = h.indicator.snapshot().await.unwrap();
        assert!(state.is_dark());
        assert_eq!(state.last_steady, Some(Color::Green));

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.source.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_leaves_light_on_last_event() {
        let mut h = harness(
            5,
            vec![Fetch::Events(vec![
                BuildEventRecord::status_changed("1", "api", BuildStatus::Failed),
                BuildEventRecord::status_changed("2", "web", BuildStatus::InProgress),
                BuildEventRecord::status_changed("3", "docs", BuildStatus::Succeeded),
            ])],
        );
        h.scheduler.start();
        time::sleep(Duration::from_secs(1)).await;

        assert_eq!(h.publisher.published().len(), 6);
        let state = h.indicator.snapshot().await.unwrap();
        assert_eq!(state.lit_colors(), vec![Color::Green]);
        assert_eq!(state.last_steady, Some(Color::Green));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_period_reread_each_cycle() {
        let mut h = harness(5, vec![]);
        let start = Instant::now();
        h.scheduler.start();
        time::sleep(Duration::from_secs(1)).await;
        h.settings.send_modify(|s| s.poll_period_secs = 10);

        time::sleep(Duration::from_secs(17)).await;
        // The delay after the first cycle was already armed with 5s.
        assert_eq!(offsets(start, &h.source.fetch_times()), vec![0, 6, 17]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_poll_period_falls_back() {
        let mut h = harness(0, vec![]);
        let start = Instant::now();
        h.scheduler.start();

        time::sleep(Duration::from_secs(32)).await;
        assert_eq!(offsets(start, &h.source.fetch_times()), vec![0, 31]);

        h.settings.send_modify(|s| s.poll_period_secs = 2);
        time::sleep(Duration::from_secs(34)).await;
        // The wait before 62 was armed with the fallback.
        assert_eq!(
            offsets(start, &h.source.fetch_times()),
            vec![0, 31, 62, 65]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_cycle_is_contained() {
        let mut h = harness(
            5,
            vec![
                Fetch::Panic,
                Fetch::Events(vec![BuildEventRecord::status_changed(
                    "9",
                    "CI",
                    BuildStatus::Failed,
                )]),
            ],
        );
        h.scheduler.start();
        time::sleep(Duration::from_secs(7)).await;

        assert!(h.scheduler.is_running());
        assert_eq!(
            h.scheduler.stats(),
            CycleStats {
                completed: 1,
                failed: 1
            }
        );
        let state = h.indicator.snapshot().await.unwrap();
        assert_eq!(state.lit_colors(), vec![Color::Red]);
    }
}
