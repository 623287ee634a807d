// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::Serialize;

use crate::types::{ClientEnvelope, ClientResponse};

pub fn parse_envelope(input: &str) -> Result<ClientEnvelope, serde_json::Error> {
    serde_json::from_str(input.trim())
}

pub fn parse_response(input: &str) -> Result<ClientResponse, serde_json::Error> {
    serde_json::from_str(input.trim())
}

/// Serialize a message as a single newline-terminated line.
pub fn encode_line<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(msg)?;
    line.push('\n');
    Ok(line)
}
