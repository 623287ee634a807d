// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Section-based TOML configuration.
//!
//! Every binary reads its own `[<section>]` table out of a shared
//! `buildlamp.toml`, searched in the working directory, then the user's
//! config directory, then `/etc/buildlamp`.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "buildlamp.toml";
const CONFIG_DIR_NAME: &str = "buildlamp";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    paths.push(
        PathBuf::from("/etc")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    );
    paths
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::ParseError(path.to_path_buf(), err.to_string())
}

/// `Ok(None)` when the file parses but has no `[key]` table.
fn load_section_from_file<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;

    let Some(section) = table.remove(key) else {
        return Ok(None);
    };
    // Round-trip through a string so serde defaults apply to missing keys.
    let section_toml = match section {
        toml::Value::Table(t) => toml::to_string(&t).map_err(|e| parse_error(path, e))?,
        other => {
            return Err(parse_error(
                path,
                format!("[{}] is a {}, not a table", key, other.type_str()),
            ))
        }
    };
    toml::from_str::<T>(&section_toml)
        .map(Some)
        .map_err(|e| parse_error(path, e))
}

/// A configuration type living under one section of `buildlamp.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    fn section_key() -> &'static str;

    /// Load from an explicit path. A file without the section is an error.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        load_section_from_file::<Self>(path, Self::section_key())?.ok_or_else(|| {
            ConfigError::ParseError(
                path.to_path_buf(),
                format!("missing [{}] section", Self::section_key()),
            )
        })
    }

    /// First file on the search path carrying the section wins. Falls back
    /// to `Default` when none does.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in config_search_paths() {
            if !path.exists() {
                continue;
            }
            if let Some(cfg) = load_section_from_file::<Self>(&path, Self::section_key())? {
                return Ok((cfg, Some(path)));
            }
            debug!("{} has no [{}] section", path.display(), Self::section_key());
        }
        Ok((Self::default(), None))
    }

    /// `--config` wins over the search path when given.
    fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match explicit {
            Some(path) => Ok((Self::load_from_file(path)?, Some(path.to_path_buf()))),
            None => Self::load_from_default_paths(),
        }
    }
}
