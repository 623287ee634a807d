// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Bearer token checks for the listener.

use std::collections::HashSet;

/// Strip a case-insensitive `Bearer ` prefix; returns the trimmed input
/// otherwise.
pub fn strip_bearer(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim_start(),
        _ => trimmed,
    }
}

pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: Option<&str>) -> Result<(), String>;
}

/// Accepts any token in a fixed set. An empty set disables auth.
#[derive(Debug, Clone, Default)]
pub struct SimpleTokenValidator {
    tokens: HashSet<String>,
}

impl SimpleTokenValidator {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenValidator for SimpleTokenValidator {
    fn validate(&self, token: Option<&str>) -> Result<(), String> {
        if self.tokens.is_empty() {
            return Ok(());
        }
        let Some(token) = token else {
            return Err("missing authorization token".into());
        };
        if self.tokens.contains(strip_bearer(token)) {
            Ok(())
        } else {
            Err("invalid authorization token".into())
        }
    }
}

pub struct NoAuthValidator;

impl TokenValidator for NoAuthValidator {
    fn validate(&self, _token: Option<&str>) -> Result<(), String> {
        Ok(())
    }
}
