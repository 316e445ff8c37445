// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::stopwatch::{StopwatchStart, stopwatch};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use proctest_metadata::Event;
use std::time::Duration;

/// Counters for a single test file.
///
/// Skipped tests and todos count as passed, so `passed + failed == total` always holds.
#[derive(Clone, Debug)]
pub struct FileStatistics {
    path: Utf8PathBuf,
    total: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    warnings: usize,
    todos: usize,
    skipped: usize,
    planned: Option<usize>,
    stopwatch: StopwatchStart,
    time_taken: Option<Duration>,
}

impl FileStatistics {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            total: 0,
            passed: 0,
            failed: 0,
            errors: 0,
            warnings: 0,
            todos: 0,
            skipped: 0,
            planned: None,
            stopwatch: stopwatch(),
            time_taken: None,
        }
    }

    pub(crate) fn record(&mut self, event: &Event) {
        match event {
            Event::Plan(count) => {
                self.planned = Some(self.planned.unwrap_or(0) + count);
            }
            Event::Pass { .. } => {
                self.total += 1;
                self.passed += 1;
            }
            Event::Fail { .. } => {
                self.total += 1;
                self.failed += 1;
            }
            Event::Skip { .. } => {
                self.total += 1;
                self.passed += 1;
                self.skipped += 1;
            }
            Event::Todo { .. } => {
                self.total += 1;
                self.passed += 1;
                self.todos += 1;
            }
            Event::Warning { .. } => self.warnings += 1,
            Event::Error(_) => self.errors += 1,
            Event::Comment { .. } => {}
        }
    }

    pub(crate) fn close(&mut self) {
        if self.time_taken.is_none() {
            self.time_taken = Some(self.stopwatch.snapshot().duration);
        }
    }

    /// The path of the test file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The number of tests that ran.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The number of tests that passed, including skipped tests and todos.
    pub fn passed(&self) -> usize {
        self.passed
    }

    /// The number of tests that failed.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// The number of errors reported outside of tests.
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// The number of warnings.
    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// The number of todos.
    pub fn todos(&self) -> usize {
        self.todos
    }

    /// The number of skipped tests.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The number of planned tests, if the file declared a plan.
    pub fn planned(&self) -> Option<usize> {
        self.planned
    }

    /// Returns true if the file declared a plan and ran a different number of tests.
    pub fn is_incomplete(&self) -> bool {
        self.planned.is_some_and(|planned| planned != self.total)
    }

    /// Returns true if there were no errors, no failures, and the plan (if any) was met.
    pub fn is_successful(&self) -> bool {
        self.errors == 0 && self.failed == 0 && !self.is_incomplete()
    }

    /// Returns true if the file has any failed test, error or warning, and so deserves a closer
    /// look in a report.
    pub fn is_dubious(&self) -> bool {
        self.failed > 0 || self.errors > 0 || self.warnings > 0
    }

    /// The time the file was first focused.
    pub fn start_time(&self) -> DateTime<Local> {
        self.stopwatch.start_time()
    }

    /// The wall time between the first focus and the close of this file, once closed.
    pub fn time_taken(&self) -> Option<Duration> {
        self.time_taken
    }

    /// Returns true once the file has been closed.
    pub fn is_closed(&self) -> bool {
        self.time_taken.is_some()
    }
}

/// Statistics for a whole run: the sum over every test file.
#[derive(Clone, Debug, Default)]
pub struct SuiteStatistics {
    files: IndexMap<Utf8PathBuf, FileStatistics>,
    time_taken: Option<Duration>,
}

impl SuiteStatistics {
    pub(crate) fn entry_index(&mut self, path: &Utf8Path) -> (usize, bool) {
        match self.files.get_index_of(path) {
            Some(index) => (index, false),
            None => {
                let (index, _) = self
                    .files
                    .insert_full(path.to_owned(), FileStatistics::new(path));
                (index, true)
            }
        }
    }

    pub(crate) fn file_at_mut(&mut self, index: usize) -> Option<&mut FileStatistics> {
        self.files.get_index_mut(index).map(|(_, stats)| stats)
    }

    pub(crate) fn set_time_taken(&mut self, time_taken: Duration) {
        self.time_taken = Some(time_taken);
    }

    /// Returns statistics for each file, in the order files were first focused.
    pub fn files(&self) -> impl ExactSizeIterator<Item = &FileStatistics> + '_ {
        self.files.values()
    }

    /// Returns statistics for the file at `path`.
    pub fn file(&self, path: &Utf8Path) -> Option<&FileStatistics> {
        self.files.get(path)
    }

    /// The number of files seen.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// The number of tests that ran.
    pub fn total(&self) -> usize {
        self.sum(FileStatistics::total)
    }

    /// The number of tests that passed, including skipped tests and todos.
    pub fn passed(&self) -> usize {
        self.sum(FileStatistics::passed)
    }

    /// The number of tests that failed.
    pub fn failed(&self) -> usize {
        self.sum(FileStatistics::failed)
    }

    /// The number of errors reported outside of tests.
    pub fn errors(&self) -> usize {
        self.sum(FileStatistics::errors)
    }

    /// The number of warnings.
    pub fn warnings(&self) -> usize {
        self.sum(FileStatistics::warnings)
    }

    /// The number of todos.
    pub fn todos(&self) -> usize {
        self.sum(FileStatistics::todos)
    }

    /// The number of skipped tests.
    pub fn skipped(&self) -> usize {
        self.sum(FileStatistics::skipped)
    }

    /// The number of planned tests across files that declared a plan, or `None` if no file did.
    pub fn planned(&self) -> Option<usize> {
        self.files
            .values()
            .filter_map(FileStatistics::planned)
            .reduce(|a, b| a + b)
    }

    /// Returns true if any file is incomplete.
    pub fn is_incomplete(&self) -> bool {
        self.files.values().any(FileStatistics::is_incomplete)
    }

    /// Returns true if any file has errors or failures, or is incomplete.
    pub fn has_any_failure_or_error(&self) -> bool {
        self.files.values().any(|file| !file.is_successful())
    }

    /// Returns true if every file was successful.
    pub fn is_successful(&self) -> bool {
        !self.has_any_failure_or_error()
    }

    /// Returns the files that weren't successful.
    pub fn failed_files(&self) -> impl Iterator<Item = &FileStatistics> + '_ {
        self.files.values().filter(|file| !file.is_successful())
    }

    /// Returns the files with any failed test, error or warning.
    pub fn dubious_files(&self) -> impl Iterator<Item = &FileStatistics> + '_ {
        self.files.values().filter(|file| file.is_dubious())
    }

    /// The wall time of the whole run, once flushed.
    pub fn time_taken(&self) -> Option<Duration> {
        self.time_taken
    }

    fn sum(&self, f: impl Fn(&FileStatistics) -> usize) -> usize {
        self.files.values().map(f).sum()
    }
}
