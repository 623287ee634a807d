// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! In-memory light for running without hardware. Every lamp change goes to
//! the log.

use std::sync::{Arc, Mutex};

use tracing::info;

use lamp_core::indicator::DeviceFuture;
use lamp_core::{Color, IndicatorState, Lamp, LightDevice};

#[derive(Debug, Clone)]
pub struct VirtualLamp {
    index: usize,
    open: bool,
    lamps: Arc<Mutex<IndicatorState>>,
}

impl VirtualLamp {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            open: false,
            lamps: Arc::default(),
        }
    }

    /// Lamps as currently shown.
    pub fn lamps(&self) -> IndicatorState {
        match self.lamps.lock() {
            Ok(lamps) => *lamps,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn show(&self, color: Color, lamp: Lamp) {
        let mut lamps = match self.lamps.lock() {
            Ok(lamps) => lamps,
            Err(poisoned) => poisoned.into_inner(),
        };
        lamps.set_lamp(color, lamp);
    }
}

impl LightDevice for VirtualLamp {
    fn describe(&self) -> String {
        format!("virtual lamp #{}", self.index)
    }

    fn open<'a>(&'a mut self) -> DeviceFuture<'a> {
        self.open = true;
        Box::pin(async { Ok(()) })
    }

    fn set_lamp<'a>(&'a mut self, color: Color, lamp: Lamp) -> DeviceFuture<'a> {
        Box::pin(async move {
            if !self.open {
                return Err("virtual lamp is not open".into());
            }
            self.show(color, lamp);
            info!("[virtual #{}] {} {:?}", self.index, color, lamp);
            Ok(())
        })
    }

    fn close<'a>(&'a mut self) -> DeviceFuture<'a> {
        self.open = false;
        Box::pin(async { Ok(()) })
    }
}
