// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::future::Future;
use std::pin::Pin;

use crate::build::BuildEventRecord;
use crate::DynResult;

/// Alias to reduce type complexity in EventSource.
pub type EventsFuture<'a> =
    Pin<Box<dyn Future<Output = DynResult<Vec<BuildEventRecord>>> + Send + 'a>>;

/// Anything that can report the current build events of the monitored
/// pipelines.
///
/// A fetch either yields the full current list of events, in the order they
/// should be processed, or fails as a whole.
pub trait EventSource: Send {
    fn name(&self) -> &str;

    fn fetch_events<'a>(&'a mut self) -> EventsFuture<'a>;
}
