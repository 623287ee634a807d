// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Event source backed by a JSON file holding an array of build event
//! records. The file is re-read on every fetch, so editing it drives the
//! light without a CI server.

use std::path::PathBuf;

use lamp_core::build::source::EventsFuture;
use lamp_core::{BuildEventRecord, EventSource};

pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl EventSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_events<'a>(&'a mut self) -> EventsFuture<'a> {
        Box::pin(async move {
            let content = tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| format!("Failed to read {}: {}", self.name, e))?;
            let records: Vec<BuildEventRecord> = serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse {}: {}", self.name, e))?;
            Ok(records)
        })
    }
}
