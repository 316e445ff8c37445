// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    decoder::{EventDecoder, split_line},
    list::TestFile,
    process::{ChildProcess, ProcessExit},
    reporter::OutputSink,
};
use bstr::ByteSlice;
use bytes::BytesMut;
use camino::{Utf8Path, Utf8PathBuf};
use proctest_metadata::ErrorRecord;
use tracing::debug;

/// Drives one test file at a time to completion: its process, its decoder, and the stderr line
/// buffer.
///
/// A launcher starts idle. [`launch`](Self::launch) starts a file, and
/// [`proceed`](Self::proceed) moves it along without blocking until the process has closed. A
/// launcher that is done can be launched again with the next file.
#[derive(Debug, Default)]
pub struct Launcher {
    state: LauncherState,
    last_exit: Option<ProcessExit>,
}

#[derive(Debug, Default)]
enum LauncherState {
    #[default]
    Idle,
    Running(Box<RunningFile>),
    Done,
}

#[derive(Debug)]
struct RunningFile {
    path: Utf8PathBuf,
    process: ChildProcess,
    decoder: Box<dyn EventDecoder>,
    errors: BytesMut,
}

impl Launcher {
    /// Creates an idle launcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts running `file`.
    ///
    /// The launcher must be done (or idle). A file that can't be started still runs to
    /// completion: its spawn error is reported through stderr.
    pub fn launch(&mut self, file: &TestFile) {
        debug_assert!(self.is_done(), "launched while a file is still running");

        let executable = file.executable();
        let mut process = ChildProcess::new(executable, file.path());
        debug!(
            path = %file.path(),
            command = %shell_words::join(process.command()),
            "launching test file",
        );
        process.execute();

        self.last_exit = None;
        self.state = LauncherState::Running(Box::new(RunningFile {
            path: file.path().to_owned(),
            process,
            decoder: executable.decoder().create(),
            errors: BytesMut::new(),
        }));
    }

    /// Forwards whatever the running file produced since the last call to `sink`, and finishes
    /// the file once its process has closed.
    ///
    /// Returns true if any output was consumed or the file finished. Does nothing unless a file
    /// is running.
    pub fn proceed(&mut self, sink: &mut dyn OutputSink) -> bool {
        let LauncherState::Running(running) = &mut self.state else {
            return false;
        };

        let mut progressed = false;

        let output = running.process.poll_output();
        if !output.is_empty() {
            progressed = true;
            running.decoder.parse(&output, sink);
        }

        let errors = running.process.poll_errors();
        if !errors.is_empty() {
            progressed = true;
            running.errors.extend_from_slice(&errors);
            while let Some(line) = split_line(&mut running.errors) {
                sink.error(stderr_record(&line, &running.path));
            }
        }

        if running.process.is_closed() {
            self.last_exit = running.process.exit();
            running.finish(sink);
            self.state = LauncherState::Done;
            progressed = true;
        }

        progressed
    }

    /// Returns true if no file is running: either nothing was launched yet, or the last file
    /// finished.
    pub fn is_done(&self) -> bool {
        matches!(self.state, LauncherState::Idle | LauncherState::Done)
    }

    /// Returns the path of the running file.
    pub fn current_file(&self) -> Option<&Utf8Path> {
        match &self.state {
            LauncherState::Running(running) => Some(&running.path),
            LauncherState::Idle | LauncherState::Done => None,
        }
    }

    /// Returns how the process of the last finished file exited.
    pub fn last_exit(&self) -> Option<ProcessExit> {
        self.last_exit
    }
}

impl RunningFile {
    fn finish(&mut self, sink: &mut dyn OutputSink) {
        let remaining = self.decoder.remaining();
        if !remaining.is_empty() {
            let first_line = remaining.lines().next().unwrap_or_default();
            debug!(
                path = %self.path,
                bytes = remaining.len(),
                "test file closed with undecodable output",
            );
            sink.error(
                ErrorRecord::new(
                    format!(
                        "could not parse test output: \"{}\"",
                        first_line.to_str_lossy()
                    ),
                    self.path.as_str(),
                    1,
                )
                .with_kind(ErrorRecord::WARNING),
            );
        }

        if !self.errors.is_empty() {
            let fragment = self.errors.split();
            sink.error(stderr_record(&fragment, &self.path));
        }

        match self.process.exit() {
            Some(exit) if exit.is_success() => {
                debug!(path = %self.path, "test file finished");
            }
            exit => {
                debug!(path = %self.path, exit = ?exit, "test file finished abnormally");
            }
        }
    }
}

fn stderr_record(line: &[u8], path: &Utf8Path) -> ErrorRecord {
    ErrorRecord::new(line.to_str_lossy(), path.as_str(), 0).with_kind(ErrorRecord::WARNING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decoder::DecoderKind,
        executable::Executable,
        reporter::{RecordingSink, SinkCall},
    };
    use pretty_assertions::assert_eq;
    use proctest_metadata::Event;
    use std::{
        sync::Arc,
        time::{Duration, Instant},
    };

    fn run_to_completion(launcher: &mut Launcher, sink: &mut RecordingSink) {
        let deadline = Instant::now() + Duration::from_secs(30);
        while !launcher.is_done() {
            if !launcher.proceed(sink) {
                assert!(Instant::now() < deadline, "launcher did not finish in time");
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    fn warning(message: &str, path: &Utf8Path, line: u32) -> Event {
        Event::Error(ErrorRecord::new(message, path.as_str(), line).with_kind(ErrorRecord::WARNING))
    }

    #[test]
    fn idle_launcher_is_done() {
        let mut launcher = Launcher::new();
        let mut sink = RecordingSink::new();
        assert!(launcher.is_done());
        assert_eq!(launcher.current_file(), None);
        assert!(!launcher.proceed(&mut sink));
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn spawn_failure_reports_stderr() {
        let executable = Arc::new(
            Executable::new(
                "missing",
                "/nonexistent/proctest-interpreter",
                DecoderKind::Compact,
            )
            .unwrap(),
        );
        let file = TestFile::new("/t/a.t", executable);
        let mut launcher = Launcher::new();
        let mut sink = RecordingSink::new();

        launcher.launch(&file);
        assert_eq!(launcher.current_file(), Some(Utf8Path::new("/t/a.t")));
        run_to_completion(&mut launcher, &mut sink);

        assert_eq!(launcher.last_exit(), Some(ProcessExit::Code(127)));
        let calls = sink.into_calls();
        assert_eq!(calls.len(), 1, "{calls:?}");
        match &calls[0] {
            SinkCall::Event(Event::Error(record)) => {
                assert!(record.is_warning());
                assert_eq!(record.file, "/t/a.t");
                assert_eq!(record.line, 0);
                assert!(
                    record
                        .message
                        .starts_with("failed to execute `/nonexistent/proctest-interpreter /t/a.t`"),
                    "{record:?}"
                );
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[cfg(unix)]
    fn sh(script: &str, decoder: DecoderKind) -> TestFile {
        // `sh -c script path` runs the script with the test file's path as $0.
        let executable =
            Executable::from_args("sh", ["sh", "-c", script], decoder).expect("valid command");
        TestFile::new("/t/script.t", Arc::new(executable))
    }

    #[cfg(unix)]
    #[test]
    fn text_output_and_stderr() {
        let file = sh(
            r"printf 'ok 1 - foo\n'; printf 'Error 1\nError 2' >&2",
            DecoderKind::Text,
        );
        let mut launcher = Launcher::new();
        let mut sink = RecordingSink::new();
        launcher.launch(&file);
        run_to_completion(&mut launcher, &mut sink);

        let path = file.path();
        let mut events = sink.into_events();
        // Stdout and stderr are independent streams, so only the relative order within each is
        // fixed.
        let pass = events.remove(
            events
                .iter()
                .position(|event| event == &Event::pass("foo"))
                .expect("pass event"),
        );
        assert_eq!(pass, Event::pass("foo"));
        assert_eq!(
            events,
            vec![warning("Error 1", path, 0), warning("Error 2", path, 0)]
        );
        assert_eq!(launcher.last_exit(), Some(ProcessExit::Code(0)));
    }

    #[cfg(unix)]
    #[test]
    fn undecodable_output_is_reported_at_close() {
        let file = sh(r#"printf '["pass",["a"]]\ngarbage\nmore'"#, DecoderKind::Compact);
        let mut launcher = Launcher::new();
        let mut sink = RecordingSink::new();
        launcher.launch(&file);
        run_to_completion(&mut launcher, &mut sink);

        assert_eq!(
            sink.into_events(),
            vec![
                Event::pass("a"),
                warning(
                    "could not parse test output: \"garbage\"",
                    file.path(),
                    1
                ),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn launcher_is_reusable() {
        let mut launcher = Launcher::new();
        let mut sink = RecordingSink::new();
        for (index, code) in [(1, 0), (2, 3)] {
            let file = sh(
                &format!("printf 'ok {index}\\n'; exit {code}"),
                DecoderKind::Text,
            );
            launcher.launch(&file);
            assert!(!launcher.is_done());
            run_to_completion(&mut launcher, &mut sink);
            assert_eq!(launcher.last_exit(), Some(ProcessExit::Code(code)));
        }
        assert_eq!(
            sink.into_events(),
            vec![Event::pass(""), Event::pass("")]
        );
    }
}
