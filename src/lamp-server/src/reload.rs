// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Live configuration reload on SIGHUP.
//!
//! Only the monitor settings are reloaded; the device, source, publisher and
//! listener keep running as started.

use std::path::{Path, PathBuf};

use tokio::sync::watch;
use tracing::{info, warn};

use lamp_app::ConfigFile;
use lamp_core::MonitorSettings;

use crate::config::{Overrides, ServerConfig};

/// Re-read `path` and build the settings snapshot it describes, with the
/// command-line overrides applied on top.
pub fn load_settings(path: &Path, overrides: &Overrides) -> Result<MonitorSettings, String> {
    let mut cfg = ServerConfig::load_from_file(path).map_err(|e| e.to_string())?;
    overrides.apply(&mut cfg);
    cfg.validate()?;
    Ok(cfg.monitor_settings())
}

/// Publish the reloaded snapshot, or keep the current one if loading failed.
/// Returns whether anything changed.
pub fn apply_reload(
    settings_tx: &watch::Sender<MonitorSettings>,
    loaded: Result<MonitorSettings, String>,
) -> bool {
    match loaded {
        Ok(settings) => {
            let changed = settings_tx.send_if_modified(|current| {
                if *current == settings {
                    return false;
                }
                *current = settings.clone();
                true
            });
            if changed {
                info!("Configuration reloaded: {:?}", settings);
            } else {
                info!("Configuration reloaded, monitor settings unchanged");
            }
            changed
        }
        Err(e) => {
            warn!("Configuration reload failed, keeping previous settings: {}", e);
            false
        }
    }
}

#[cfg(unix)]
pub async fn run_reload(
    path: PathBuf,
    overrides: Overrides,
    settings_tx: watch::Sender<MonitorSettings>,
) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    info!("Send SIGHUP to reload {}", path.display());
    while hangup.recv().await.is_some() {
        apply_reload(&settings_tx, load_settings(&path, &overrides));
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn run_reload(
    path: PathBuf,
    _overrides: Overrides,
    _settings_tx: watch::Sender<MonitorSettings>,
) -> std::io::Result<()> {
    info!("Configuration reload is not supported here ({})", path.display());
    Ok(())
}
