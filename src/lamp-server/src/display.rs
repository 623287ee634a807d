// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Console status display, used while publishing is disabled.

use std::io::IsTerminal;

use lamp_core::{DisplayLine, StatusDisplay};

const HIGHLIGHT_START: &str = "\x1b[1;31m";
const HIGHLIGHT_END: &str = "\x1b[0m";

pub struct ConsoleDisplay {
    ansi: bool,
}

impl ConsoleDisplay {
    /// Highlight with ANSI colours only when stdout is a terminal.
    pub fn stdout() -> Self {
        Self {
            ansi: std::io::stdout().is_terminal(),
        }
    }
}

pub fn format_line(line: &DisplayLine, ansi: bool) -> String {
    if line.highlight && ansi {
        format!("{}{}{}", HIGHLIGHT_START, line.text, HIGHLIGHT_END)
    } else if line.highlight {
        format!("!! {}", line.text)
    } else {
        line.text.clone()
    }
}

impl StatusDisplay for ConsoleDisplay {
    fn show(&self, line: &DisplayLine) {
        println!("{}", format_line(line, self.ansi));
    }
}
