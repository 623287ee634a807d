// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Build event sources.

pub mod devops;
pub mod file;

use lamp_core::{DynResult, EventSource};

use crate::config::SourceConfig;

pub fn build_source(cfg: &SourceConfig) -> DynResult<Box<dyn EventSource>> {
    match cfg.source_type.as_str() {
        "devops" => {
            let url = cfg.url.clone().ok_or("[source].url is required")?;
            let token = cfg.token.clone().ok_or("[source].token is required")?;
            Ok(Box::new(devops::DevOpsSource::new(
                url,
                token,
                cfg.builds.clone(),
            )?))
        }
        "file" => {
            let path = cfg.path.clone().ok_or("[source].path is required")?;
            Ok(Box::new(file::FileSource::new(path)))
        }
        other => Err(format!("Unknown event source: {}", other).into()),
    }
}
