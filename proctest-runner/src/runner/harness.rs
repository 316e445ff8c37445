// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Launcher;
use crate::{
    config::{HarnessConfig, Parallelism},
    helpers::plural,
    list::TestFile,
    reporter::{OutputSink, SuiteAggregator, SuiteStatistics},
};
use std::time::Duration;
use tracing::debug;

/// Test harness builder.
#[derive(Clone, Debug)]
pub struct HarnessBuilder {
    processes: Parallelism,
    idle_interval: Duration,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            processes: Parallelism::default(),
            idle_interval: Duration::from_millis(2),
        }
    }
}

impl HarnessBuilder {
    /// Creates a builder with one process and the default idle interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the settings in `config`.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            processes: config.processes(),
            idle_interval: config.idle_interval(),
        }
    }

    /// Sets the number of test files run at the same time.
    pub fn set_processes(&mut self, processes: Parallelism) -> &mut Self {
        self.processes = processes;
        self
    }

    /// Sets how long to sleep after a round in which no test file made progress.
    pub fn set_idle_interval(&mut self, idle_interval: Duration) -> &mut Self {
        self.idle_interval = idle_interval;
        self
    }

    /// Creates a new harness.
    pub fn build(&self) -> Harness {
        Harness {
            processes: self.processes.compute(),
            idle_interval: self.idle_interval,
        }
    }
}

/// Runs a queue of test files on a fixed number of [`Launcher`]s.
///
/// Everything happens on the calling thread: each round starts queued files on launchers that are
/// done, then lets every running launcher forward its output. The sink is focused on a file
/// before anything is delivered for it, and closed as soon as the file finishes.
#[derive(Clone, Debug)]
pub struct Harness {
    processes: usize,
    idle_interval: Duration,
}

impl Harness {
    /// Returns the number of test files run at the same time.
    pub fn processes(&self) -> usize {
        self.processes
    }

    /// Runs every file in `files`, in order, reporting to `sink`.
    ///
    /// Returns true if every file was successful.
    pub fn run<'a>(
        &self,
        files: impl IntoIterator<Item = &'a TestFile>,
        sink: &mut dyn OutputSink,
    ) -> bool {
        self.run_collect(files, sink).is_successful()
    }

    /// Runs every file in `files` like [`run`](Self::run), and returns the statistics.
    pub fn run_collect<'a>(
        &self,
        files: impl IntoIterator<Item = &'a TestFile>,
        sink: &mut dyn OutputSink,
    ) -> SuiteStatistics {
        let mut aggregator = SuiteAggregator::new(sink);
        self.execute(files, &mut aggregator);

        let stats = aggregator.into_statistics();
        debug!(
            "ran {} test {} with {} {}: {} passed, {} failed, {} errors",
            stats.file_count(),
            plural::files_str(stats.file_count()),
            self.processes,
            plural::processes_str(self.processes),
            stats.passed(),
            stats.failed(),
            stats.errors(),
        );
        stats
    }

    fn execute<'a>(
        &self,
        files: impl IntoIterator<Item = &'a TestFile>,
        sink: &mut dyn OutputSink,
    ) {
        let mut queue = files.into_iter().peekable();
        let mut launchers: Vec<_> = (0..self.processes).map(|_| Launcher::new()).collect();

        loop {
            let mut progressed = false;

            for launcher in &mut launchers {
                if !launcher.is_done() {
                    continue;
                }
                let Some(file) = queue.next() else {
                    break;
                };
                sink.focus(file.path());
                launcher.launch(file);
                progressed = true;
            }

            for launcher in &mut launchers {
                let Some(path) = launcher.current_file() else {
                    continue;
                };
                sink.focus(path);
                progressed |= launcher.proceed(sink);
                if launcher.is_done() {
                    sink.close();
                }
            }

            if queue.peek().is_none() && launchers.iter().all(Launcher::is_done) {
                break;
            }
            if !progressed {
                std::thread::sleep(self.idle_interval);
            }
        }

        sink.flush();
    }
}
