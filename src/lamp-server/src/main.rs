// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod display;
mod listener;
mod publisher;
mod reload;
mod source;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use lamp_app::{init_logging, normalize_name, ConfigFile};
use lamp_backend::{register_builtin_backends_on, RegistrationContext};
use lamp_core::{spawn_indicator, DynResult, EventDispatcher, PollingScheduler};

use config::{Overrides, ServerConfig};
use display::ConsoleDisplay;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - build status light daemon");
const INDICATOR_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Light backend to use (e.g. virtual, serial)
    #[arg(short = 'b', long = "backend")]
    backend: Option<String>,
    /// Index of the light device among the attached ones
    #[arg(short = 'd', long = "device-index")]
    device_index: Option<usize>,
    /// Seconds between polling cycles
    #[arg(short = 'p', long = "poll-period", value_name = "SECS")]
    poll_period: Option<u64>,
    /// Show status changes on the console instead of publishing them
    #[arg(long = "disable-publish")]
    disable_publish: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend.as_deref().map(normalize_name),
            device_index: self.device_index,
            poll_period_secs: self.poll_period,
            disable_publish: self.disable_publish,
        }
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let mut registry = RegistrationContext::new();
    register_builtin_backends_on(&mut registry);

    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_combined_toml());
        return Ok(());
    }

    let overrides = cli.overrides();
    let (mut cfg, config_path) = ServerConfig::load(cli.config.as_deref())?;
    overrides.apply(&mut cfg);
    cfg.validate()
        .map_err(|e| format!("Invalid server configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    match config_path {
        Some(ref path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    let backend = normalize_name(&cfg.indicator.backend);
    if !registry.is_backend_registered(&backend) {
        return Err(format!(
            "Unknown light backend: {} (available: {})",
            backend,
            registry.registered_backends().join(", ")
        )
        .into());
    }
    let device = registry.build_device(&backend, cfg.indicator.device_access())?;
    info!(
        "Starting lamp-server (light: {}, poll period: {}s, publish: {})",
        device.describe(),
        cfg.monitor.poll_period_secs,
        if cfg.monitor.disable_publish_notification {
            "disabled"
        } else {
            cfg.publish.publish_type.as_str()
        }
    );

    let (settings_tx, settings_rx) = watch::channel(cfg.monitor_settings());
    let (indicator, indicator_task) = spawn_indicator(device, settings_rx.clone());

    let source = source::build_source(&cfg.source)?;
    info!("Watching builds from {}", source.name());
    let publisher = publisher::build_publisher(&cfg.publish)?;
    let dispatcher = EventDispatcher::new(
        publisher,
        Box::new(ConsoleDisplay::stdout()),
        indicator.clone(),
        settings_rx.clone(),
    );
    let mut scheduler = PollingScheduler::new(source, dispatcher, settings_rx);
    scheduler.start();

    let mut task_handles: Vec<JoinHandle<()>> = Vec::new();

    if cfg.listen.enabled {
        let listen_addr = SocketAddr::from((cfg.listen.listen, cfg.listen.port));
        let auth_tokens = cfg.listen.auth.tokens.clone();
        let listener_indicator = indicator.clone();
        task_handles.push(tokio::spawn(async move {
            if let Err(e) =
                listener::run_listener(listen_addr, listener_indicator, auth_tokens).await
            {
                error!("Listener error: {:?}", e);
            }
        }));
    }

    // Without a file there is nothing to reload; the sender still has to
    // outlive the receivers.
    let _settings_tx = match config_path {
        Some(path) => {
            task_handles.push(tokio::spawn(async move {
                if let Err(e) = reload::run_reload(path, overrides, settings_tx).await {
                    warn!("Configuration reload disabled: {}", e);
                }
            }));
            None
        }
        None => Some(settings_tx),
    };

    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");

    if let Some(task) = scheduler.stop() {
        let _ = task.await;
    }
    let stats = scheduler.stats();
    info!(
        "Polling stopped after {} cycle(s), {} failed",
        stats.completed, stats.failed
    );

    if let Err(e) = indicator.shutdown().await {
        warn!("Light shutdown failed: {}", e);
    }
    for handle in &task_handles {
        handle.abort();
    }
    for handle in task_handles {
        let _ = handle.await;
    }
    drop(scheduler);
    drop(indicator);

    if tokio::time::timeout(INDICATOR_SHUTDOWN_TIMEOUT, indicator_task)
        .await
        .is_err()
    {
        warn!("Light task did not finish in time");
    }

    Ok(())
}
