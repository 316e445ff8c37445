// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{ErrorRecord, Event, Frame};
use std::io::{self, Write};

/// Writes frames in the compact wire format.
///
/// This is the producer side of the protocol: a test file written in Rust wraps its stdout in a
/// `FrameWriter` and reports each outcome through it. Every frame is written as one line and
/// flushed immediately, so the harness sees results as they happen.
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
    failed: usize,
    errors: usize,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a new writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: 0,
            errors: 0,
        }
    }

    /// Writes a single frame.
    pub fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        match frame {
            Frame::Event(Event::Fail { .. }) => self.failed += 1,
            Frame::Event(Event::Error(_)) => self.errors += 1,
            _ => {}
        }
        let mut line = frame.encode();
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }

    /// Writes a single event.
    pub fn write_event(&mut self, event: Event) -> io::Result<()> {
        self.write_frame(&Frame::Event(event))
    }

    /// Announces the number of tests.
    pub fn plan(&mut self, count: usize) -> io::Result<()> {
        self.write_event(Event::Plan(count))
    }

    /// Reports a passed test.
    pub fn pass(&mut self, message: impl Into<String>) -> io::Result<()> {
        self.write_event(Event::pass(message))
    }

    /// Reports a failed test.
    pub fn fail(
        &mut self,
        message: impl Into<String>,
        error: Option<ErrorRecord>,
    ) -> io::Result<()> {
        self.write_event(Event::Fail {
            message: message.into(),
            error,
        })
    }

    /// Reports a skipped test.
    pub fn skip(
        &mut self,
        message: impl Into<String>,
        reason: impl Into<String>,
    ) -> io::Result<()> {
        self.write_event(Event::skip(message, reason))
    }

    /// Reports a test that is yet to be written.
    pub fn todo(&mut self, message: impl Into<String>) -> io::Result<()> {
        self.write_event(Event::todo(message))
    }

    /// Reports a warning.
    pub fn warning(
        &mut self,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> io::Result<()> {
        self.write_event(Event::warning(message, file, line))
    }

    /// Reports an error.
    pub fn error(&mut self, error: ErrorRecord) -> io::Result<()> {
        self.write_event(Event::Error(error))
    }

    /// Writes a comment.
    pub fn comment(&mut self, message: impl Into<String>) -> io::Result<()> {
        self.write_event(Event::comment(message))
    }

    /// Returns true if no failures or errors have been written so far.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
