// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Three-colour build indicator.
//!
//! [`machine::IndicatorStateMachine`] owns the logical [`IndicatorState`] and
//! drives a [`LightDevice`]; [`task`] serialises every caller onto a single
//! task that owns the machine.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::DynResult;

pub mod command;
pub mod machine;
pub mod task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Red, Color::Green, Color::Blue];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

/// Output of a single lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lamp {
    #[default]
    Off,
    Steady,
    Flashing,
}

impl Lamp {
    pub fn is_lit(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Logical state of the light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndicatorState {
    pub red: Lamp,
    pub green: Lamp,
    pub blue: Lamp,
    /// Colour of the most recent steady transition, replayed when a build
    /// is stopped.
    pub last_steady: Option<Color>,
}

impl IndicatorState {
    pub fn lamp(&self, color: Color) -> Lamp {
        match color {
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Blue => self.blue,
        }
    }

    pub fn set_lamp(&mut self, color: Color, lamp: Lamp) {
        match color {
            Color::Red => self.red = lamp,
            Color::Green => self.green = lamp,
            Color::Blue => self.blue = lamp,
        }
    }

    /// Colours currently steady or flashing.
    pub fn lit_colors(&self) -> Vec<Color> {
        Color::ALL
            .into_iter()
            .filter(|c| self.lamp(*c).is_lit())
            .collect()
    }

    pub fn is_dark(&self) -> bool {
        self.lit_colors().is_empty()
    }
}

/// Alias to reduce type complexity in LightDevice.
pub type DeviceFuture<'a> = Pin<Box<dyn Future<Output = DynResult<()>> + Send + 'a>>;

/// Driver for a physical or virtual three-colour light.
///
/// Every lamp change is bracketed by `open` and `close`; `release` gives the
/// device back for good on shutdown.
pub trait LightDevice: Send {
    fn describe(&self) -> String;

    fn open<'a>(&'a mut self) -> DeviceFuture<'a>;

    fn set_lamp<'a>(&'a mut self, color: Color, lamp: Lamp) -> DeviceFuture<'a>;

    fn close<'a>(&'a mut self) -> DeviceFuture<'a>;

    fn release<'a>(&'a mut self) -> DeviceFuture<'a> {
        Box::pin(std::future::ready(Ok(())))
    }
}
