// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Serial-attached three-colour lamp.
//!
//! The controller takes one ASCII line per lamp change: the colour letter
//! (`R`, `G`, `B`) followed by `0` off, `1` on or `2` flashing, e.g. `G2\n`.
//! The port is opened for each operation and closed again afterwards so a
//! replugged lamp is picked up on the next change.

use tokio::io::AsyncWriteExt;
use tokio::time::{timeout, Duration};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::debug;

use lamp_core::indicator::DeviceFuture;
use lamp_core::{Color, DynResult, Lamp, LightDevice};

use crate::DeviceAccess;

const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

pub struct SerialLamp {
    path: String,
    baud: u32,
    port: Option<SerialStream>,
}

impl SerialLamp {
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self {
            path: path.into(),
            baud,
            port: None,
        }
    }

    /// Use the configured port, or the `index`-th serial port on the system.
    pub fn from_access(access: &DeviceAccess) -> DynResult<Self> {
        let path = match &access.port {
            Some(port) => port.clone(),
            None => {
                let ports = tokio_serial::available_ports()?;
                let count = ports.len();
                ports
                    .into_iter()
                    .nth(access.index)
                    .map(|info| info.port_name)
                    .ok_or_else(|| {
                        format!(
                            "No serial lamp at index {} ({} serial port(s) found)",
                            access.index, count
                        )
                    })?
            }
        };
        Ok(Self::new(path, access.baud))
    }
}

/// Wire line for one lamp change.
pub fn encode_command(color: Color, lamp: Lamp) -> String {
    let letter = match color {
        Color::Red => 'R',
        Color::Green => 'G',
        Color::Blue => 'B',
    };
    let level = match lamp {
        Lamp::Off => '0',
        Lamp::Steady => '1',
        Lamp::Flashing => '2',
    };
    format!("{}{}\n", letter, level)
}

impl LightDevice for SerialLamp {
    fn describe(&self) -> String {
        format!("serial lamp {} @ {}", self.path, self.baud)
    }

    fn open<'a>(&'a mut self) -> DeviceFuture<'a> {
        Box::pin(async move {
            let port = tokio_serial::new(&self.path, self.baud).open_native_async()?;
            self.port = Some(port);
            Ok(())
        })
    }

    fn set_lamp<'a>(&'a mut self, color: Color, lamp: Lamp) -> DeviceFuture<'a> {
        Box::pin(async move {
            let port = self
                .port
                .as_mut()
                .ok_or_else(|| format!("{} is not open", self.path))?;
            let line = encode_command(color, lamp);
            debug!("{} <- {}", self.path, line.trim_end());
            timeout(WRITE_TIMEOUT, async {
                port.write_all(line.as_bytes()).await?;
                port.flush().await
            })
            .await
            .map_err(|_| "serial lamp write timeout")??;
            Ok(())
        })
    }

    fn close<'a>(&'a mut self) -> DeviceFuture<'a> {
        self.port = None;
        Box::pin(async { Ok(()) })
    }

    fn release<'a>(&'a mut self) -> DeviceFuture<'a> {
        self.port = None;
        Box::pin(async { Ok(()) })
    }
}
