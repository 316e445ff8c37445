// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutputSink, SuiteStatistics};
use crate::stopwatch::{StopwatchStart, stopwatch};
use camino::Utf8Path;
use proctest_metadata::Event;
use tracing::{debug, trace};

/// Collects [`SuiteStatistics`] from the events passing through it, and forwards everything to an
/// inner sink.
///
/// Events are attributed to the most recently focused file. Events that arrive before any focus
/// are attributed to a file with an empty path.
#[derive(Debug)]
pub struct SuiteAggregator<S> {
    inner: S,
    stats: SuiteStatistics,
    current: Option<usize>,
    stopwatch: StopwatchStart,
}

impl<S: OutputSink> SuiteAggregator<S> {
    /// Creates a new aggregator forwarding to `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stats: SuiteStatistics::default(),
            current: None,
            stopwatch: stopwatch(),
        }
    }

    /// Returns the statistics gathered so far.
    pub fn statistics(&self) -> &SuiteStatistics {
        &self.stats
    }

    /// Returns the inner sink.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Consumes the aggregator, returning the inner sink and the statistics.
    pub fn into_parts(self) -> (S, SuiteStatistics) {
        (self.inner, self.stats)
    }

    /// Consumes the aggregator, returning the statistics.
    pub fn into_statistics(self) -> SuiteStatistics {
        self.stats
    }

    fn current_index(&mut self) -> usize {
        match self.current {
            Some(index) => index,
            None => {
                debug!("event received outside of a focused file");
                let (index, _) = self.stats.entry_index(Utf8Path::new(""));
                self.current = Some(index);
                index
            }
        }
    }
}

impl<S: OutputSink> OutputSink for SuiteAggregator<S> {
    fn focus(&mut self, path: &Utf8Path) {
        let (index, created) = self.stats.entry_index(path);
        if created {
            trace!(%path, "started collecting statistics");
        }
        self.current = Some(index);
        self.inner.focus(path);
    }

    fn event(&mut self, event: Event) {
        let index = self.current_index();
        if let Some(file) = self.stats.file_at_mut(index) {
            file.record(&event);
        }
        self.inner.event(event);
    }

    fn close(&mut self) {
        if let Some(file) = self.current.and_then(|index| self.stats.file_at_mut(index)) {
            file.close();
        }
        self.current = None;
        self.inner.close();
    }

    fn flush(&mut self) {
        self.stats
            .set_time_taken(self.stopwatch.snapshot().duration);
        self.inner.flush();
    }
}
