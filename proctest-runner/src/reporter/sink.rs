// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use proctest_metadata::{ErrorRecord, Event, Frame, FrameWriter};
use std::io::Write;
use tracing::warn;

/// A consumer of the events produced by running test files.
///
/// The harness brackets the events of each file: it calls [`focus`](Self::focus) with the file's
/// path before delivering anything for that file, and [`close`](Self::close) once the file is
/// done. With several files running at once, `focus` is called again each time the harness
/// switches to another file, so events always belong to the most recently focused path.
/// [`flush`](Self::flush) is called once at the end of the run.
///
/// Implementors handle every outcome in [`event`](Self::event). The per-outcome methods are
/// conveniences that build the corresponding [`Event`].
pub trait OutputSink {
    /// Starts or resumes reporting on the file at `path`.
    fn focus(&mut self, path: &Utf8Path);

    /// Handles an outcome of the focused file.
    fn event(&mut self, event: Event);

    /// Finishes reporting on the focused file.
    fn close(&mut self);

    /// Finishes the run.
    fn flush(&mut self);

    /// Announces that `count` more tests are planned.
    fn plan(&mut self, count: usize) {
        self.event(Event::Plan(count));
    }

    /// Reports a passed test.
    fn pass(&mut self, message: &str) {
        self.event(Event::pass(message));
    }

    /// Reports a failed test.
    fn fail(&mut self, message: &str, error: Option<ErrorRecord>) {
        self.event(Event::Fail {
            message: message.to_owned(),
            error,
        });
    }

    /// Reports a skipped test.
    fn skip(&mut self, message: &str, reason: &str) {
        self.event(Event::skip(message, reason));
    }

    /// Reports a test that is yet to be written.
    fn todo(&mut self, message: &str) {
        self.event(Event::todo(message));
    }

    /// Reports a warning.
    fn warning(&mut self, message: &str, file: &str, line: u32) {
        self.event(Event::warning(message, file, line));
    }

    /// Reports an error.
    fn error(&mut self, error: ErrorRecord) {
        self.event(Event::Error(error));
    }

    /// Reports free-form commentary.
    fn comment(&mut self, message: &str) {
        self.event(Event::comment(message));
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn focus(&mut self, path: &Utf8Path) {
        (**self).focus(path);
    }

    fn event(&mut self, event: Event) {
        (**self).event(event);
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn focus(&mut self, path: &Utf8Path) {
        (**self).focus(path);
    }

    fn event(&mut self, event: Event) {
        (**self).event(event);
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}

/// Re-emits everything in the compact wire format, so that a run can be nested inside an outer
/// harness.
///
/// Write errors are logged and otherwise ignored.
impl<W: Write> OutputSink for FrameWriter<W> {
    fn focus(&mut self, path: &Utf8Path) {
        write_or_warn(
            self,
            &Frame::Focus {
                path: path.to_string(),
            },
        );
    }

    fn event(&mut self, event: Event) {
        write_or_warn(self, &Frame::Event(event));
    }

    fn close(&mut self) {
        write_or_warn(self, &Frame::Close);
    }

    fn flush(&mut self) {
        write_or_warn(self, &Frame::Flush);
    }
}

fn write_or_warn<W: Write>(writer: &mut FrameWriter<W>, frame: &Frame) {
    if let Err(err) = writer.write_frame(frame) {
        warn!(method = frame.method(), %err, "failed to write frame");
    }
}

/// A sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn focus(&mut self, _path: &Utf8Path) {}

    fn event(&mut self, _event: Event) {}

    fn close(&mut self) {}

    fn flush(&mut self) {}
}

/// A call made to a [`RecordingSink`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SinkCall {
    /// [`OutputSink::focus`].
    Focus(Utf8PathBuf),

    /// [`OutputSink::event`].
    Event(Event),

    /// [`OutputSink::close`].
    Close,

    /// [`OutputSink::flush`].
    Flush,
}

/// A sink that records every call made to it, in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    /// Creates a new, empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the calls made so far.
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Returns the calls made, consuming the sink.
    pub fn into_calls(self) -> Vec<SinkCall> {
        self.calls
    }

    /// Returns only the events, consuming the sink.
    pub fn into_events(self) -> Vec<Event> {
        self.calls
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Event(event) => Some(event),
                SinkCall::Focus(_) | SinkCall::Close | SinkCall::Flush => None,
            })
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn focus(&mut self, path: &Utf8Path) {
        self.calls.push(SinkCall::Focus(path.to_owned()));
    }

    fn event(&mut self, event: Event) {
        self.calls.push(SinkCall::Event(event));
    }

    fn close(&mut self) {
        self.calls.push(SinkCall::Close);
    }

    fn flush(&mut self) {
        self.calls.push(SinkCall::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn convenience_methods_build_events() {
        let mut sink = RecordingSink::new();
        sink.plan(3);
        sink.pass("adds");
        sink.fail("subtracts", None);
        sink.skip("divides", "no floats");
        sink.todo("multiplies");
        sink.warning("careful", "/t/a.t", 4);
        sink.error(ErrorRecord::new("boom", "/t/a.t", 5));
        sink.comment("done");

        assert_eq!(
            sink.into_events(),
            vec![
                Event::Plan(3),
                Event::pass("adds"),
                Event::fail("subtracts"),
                Event::skip("divides", "no floats"),
                Event::todo("multiplies"),
                Event::warning("careful", "/t/a.t", 4),
                Event::Error(ErrorRecord::new("boom", "/t/a.t", 5)),
                Event::comment("done"),
            ]
        );
    }

    #[test]
    fn frame_writer_reemits_frames() {
        let mut writer = FrameWriter::new(Vec::new());
        {
            let sink: &mut dyn OutputSink = &mut writer;
            sink.focus(Utf8Path::new("/t/a.t"));
            sink.pass("adds");
            sink.close();
            sink.flush();
        }
        assert!(writer.is_success());

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            output,
            indoc! {r#"
                ["focus",["/t/a.t"]]
                ["pass",["adds"]]
                ["close",[]]
                ["flush",[]]
            "#}
        );
    }
}
