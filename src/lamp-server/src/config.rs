// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for lamp-server.
//!
//! Config is loaded from the `[lamp-server]` section of `buildlamp.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./buildlamp.toml`
//! 3. `~/.config/buildlamp/buildlamp.toml`
//! 4. `/etc/buildlamp/buildlamp.toml`

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use lamp_app::ConfigFile;
use lamp_backend::{DeviceAccess, DEFAULT_BAUD};
use lamp_core::{MonitorSettings, StoppedOutcome};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub general: GeneralConfig,
    /// Polling and publishing behaviour; reloadable at runtime.
    pub monitor: MonitorConfig,
    pub indicator: IndicatorConfig,
    /// Where build events come from.
    pub source: SourceConfig,
    /// Where status changes are forwarded to.
    pub publish: PublishConfig,
    /// JSON TCP listener for remote indicator commands.
    pub listen: ListenConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between the end of one poll cycle and the next
    pub poll_period_secs: u64,
    /// Show events on the console instead of publishing them
    pub disable_publish_notification: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_period_secs: 30,
            disable_publish_notification: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Light backend ("virtual", "serial")
    pub backend: String,
    /// Which device to bind when several are attached
    pub device_index: usize,
    /// Explicit serial port; overrides `device_index`
    pub port: Option<String>,
    pub baud: u32,
    /// How long a stopped build flashes the last steady colour
    pub stopped_flash_secs: u64,
    /// What follows the flash: "off" or "restore"
    pub stopped_outcome: StoppedOutcome,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            backend: "virtual".to_string(),
            device_index: 0,
            port: None,
            baud: DEFAULT_BAUD,
            stopped_flash_secs: 15,
            stopped_outcome: StoppedOutcome::Off,
        }
    }
}

impl IndicatorConfig {
    pub fn device_access(&self) -> DeviceAccess {
        DeviceAccess {
            index: self.device_index,
            port: self.port.clone(),
            baud: self.baud,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// "devops" or "file"
    #[serde(rename = "type")]
    pub source_type: String,
    /// Collection URL, e.g. https://dev.azure.com/contoso
    pub url: Option<String>,
    /// Personal access token
    pub token: Option<String>,
    /// JSON file with build event records (for type = "file")
    pub path: Option<PathBuf>,
    /// Build definitions to watch (for type = "devops")
    pub builds: Vec<BuildRef>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source_type: "file".to_string(),
            url: None,
            token: None,
            path: Some(PathBuf::from("builds.json")),
            builds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRef {
    pub project: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// "log" or "tcp"
    #[serde(rename = "type")]
    pub publish_type: String,
    /// Remote lamp-server host (for type = "tcp")
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Token sent with every remote command
    pub token: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            publish_type: "log".to_string(),
            host: None,
            port: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub enabled: bool,
    pub listen: IpAddr,
    pub port: u16,
    pub auth: AuthConfig,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 4540,
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Valid tokens (empty = no auth required)
    pub tokens: Vec<String>,
}

/// Command-line values that win over the file, also after a reload.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub device_index: Option<usize>,
    pub poll_period_secs: Option<u64>,
    pub disable_publish: bool,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut ServerConfig) {
        if let Some(backend) = &self.backend {
            cfg.indicator.backend = backend.clone();
        }
        if let Some(index) = self.device_index {
            cfg.indicator.device_index = index;
        }
        if let Some(secs) = self.poll_period_secs {
            cfg.monitor.poll_period_secs = secs;
        }
        if self.disable_publish {
            cfg.monitor.disable_publish_notification = true;
        }
    }
}

impl ServerConfig {
    /// Snapshot of the values components read live.
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_period_secs: self.monitor.poll_period_secs,
            disable_publish: self.monitor.disable_publish_notification,
            stopped_flash_secs: self.indicator.stopped_flash_secs,
            stopped_outcome: self.indicator.stopped_outcome,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        if self.monitor.poll_period_secs == 0 {
            return Err("[monitor].poll_period_secs must be > 0".to_string());
        }
        if self.indicator.backend.trim().is_empty() {
            return Err("[indicator].backend must not be empty".to_string());
        }
        if self.indicator.baud == 0 {
            return Err("[indicator].baud must be > 0".to_string());
        }

        validate_source(&self.source)?;
        validate_publish(&self.publish)?;

        if self.listen.enabled && self.listen.port == 0 {
            return Err("[listen].port must be > 0 when the listener is enabled".to_string());
        }
        validate_tokens("[listen.auth].tokens", &self.listen.auth.tokens)?;
        Ok(())
    }

    /// Example configuration under the `[lamp-server]` header, suitable for a
    /// combined `buildlamp.toml`.
    pub fn example_combined_toml() -> String {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(rename = "lamp-server")]
            inner: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            monitor: MonitorConfig::default(),
            indicator: IndicatorConfig {
                backend: "serial".to_string(),
                port: Some("/dev/ttyUSB0".to_string()),
                ..IndicatorConfig::default()
            },
            source: SourceConfig {
                source_type: "devops".to_string(),
                url: Some("https://dev.azure.com/contoso".to_string()),
                token: Some("personal-access-token".to_string()),
                path: None,
                builds: vec![BuildRef {
                    project: "Fabrikam".to_string(),
                    definition: "Fabrikam-CI".to_string(),
                }],
            },
            publish: PublishConfig::default(),
            listen: ListenConfig {
                enabled: true,
                ..ListenConfig::default()
            },
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    match level {
        None | Some("trace" | "debug" | "info" | "warn" | "error") => Ok(()),
        Some(other) => Err(format!(
            "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
            other
        )),
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).unwrap_or("").is_empty()
}

fn validate_source(source: &SourceConfig) -> Result<(), String> {
    match source.source_type.as_str() {
        "devops" => {
            if is_blank(source.url.as_deref()) {
                return Err("[source].url must be set for type = 'devops'".to_string());
            }
            if is_blank(source.token.as_deref()) {
                return Err("[source].token must be set for type = 'devops'".to_string());
            }
            if source.builds.is_empty() {
                return Err("[[source.builds]] must list at least one definition".to_string());
            }
            if source
                .builds
                .iter()
                .any(|b| b.project.trim().is_empty() || b.definition.trim().is_empty())
            {
                return Err("[[source.builds]] entries need both project and definition".to_string());
            }
            Ok(())
        }
        "file" => {
            if source.path.is_none() {
                return Err("[source].path must be set for type = 'file'".to_string());
            }
            Ok(())
        }
        other => Err(format!(
            "[source].type '{}' is invalid (expected 'devops' or 'file')",
            other
        )),
    }
}

fn validate_publish(publish: &PublishConfig) -> Result<(), String> {
    match publish.publish_type.as_str() {
        "log" => Ok(()),
        "tcp" => {
            if is_blank(publish.host.as_deref()) {
                return Err("[publish].host must be set for type = 'tcp'".to_string());
            }
            if publish.port.unwrap_or(0) == 0 {
                return Err("[publish].port must be > 0 for type = 'tcp'".to_string());
            }
            Ok(())
        }
        other => Err(format!(
            "[publish].type '{}' is invalid (expected 'log' or 'tcp')",
            other
        )),
    }
}

fn validate_tokens(path: &str, tokens: &[String]) -> Result<(), String> {
    if tokens.iter().any(|t| t.trim().is_empty()) {
        return Err(format!("{path} must not contain empty tokens"));
    }
    Ok(())
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "lamp-server"
    }
}
