// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! JSON line protocol spoken by the lamp-server listener.
//!
//! One request per line, one response per line. Requests carry an optional
//! bearer token next to the command tag.

pub mod auth;
pub mod codec;
pub mod mapping;
pub mod types;

pub use auth::{NoAuthValidator, SimpleTokenValidator, TokenValidator};
pub use codec::{encode_line, parse_envelope, parse_response};
pub use mapping::client_command_to_indicator;
pub use types::{ClientCommand, ClientEnvelope, ClientResponse};
