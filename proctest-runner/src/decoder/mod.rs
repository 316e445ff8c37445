// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming decoders that turn the raw output of a test file into events.
//!
//! Output arrives in arbitrarily sized chunks. A decoder appends each chunk to its buffer, emits
//! an event for every complete frame at the front of the buffer, and keeps the rest for the next
//! chunk. No byte is ever dropped: whatever never resolves into a frame is still in the buffer
//! when the process closes, and is reported by the launcher.

mod compact;
mod text;

pub use compact::CompactDecoder;
pub use text::TextDecoder;

use crate::{errors::DecoderKindParseError, reporter::OutputSink};
use serde::Deserialize;
use std::{fmt, str::FromStr};

/// A streaming decoder for the output of one test file.
pub trait EventDecoder: fmt::Debug {
    /// Appends `chunk` to the buffer and forwards the events of every complete frame to `sink`.
    fn parse(&mut self, chunk: &[u8], sink: &mut dyn OutputSink);

    /// Returns true if every byte seen so far has been consumed.
    fn done(&self) -> bool;

    /// Returns the bytes that haven't resolved into a frame yet.
    fn remaining(&self) -> &[u8];
}

/// The wire format a test file writes to stdout.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum DecoderKind {
    /// One JSON record per line, as written by
    /// [`FrameWriter`](proctest_metadata::FrameWriter).
    Compact,

    /// Test Anything Protocol style `ok`/`not ok` lines.
    Text,
}

impl DecoderKind {
    /// Returns the string representation of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Text => "text",
        }
    }

    /// Creates a fresh decoder of this kind.
    pub fn create(self) -> Box<dyn EventDecoder> {
        match self {
            Self::Compact => Box::new(CompactDecoder::new()),
            Self::Text => Box::new(TextDecoder::new()),
        }
    }
}

impl FromStr for DecoderKind {
    type Err = DecoderKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(Self::Compact),
            "text" => Ok(Self::Text),
            other => Err(DecoderKindParseError::new(other)),
        }
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits the next complete line off the front of `buffer`, without its terminator.
///
/// A trailing `\r` is stripped as well.
pub(crate) fn split_line(buffer: &mut bytes::BytesMut) -> Option<bytes::Bytes> {
    use bstr::ByteSlice;

    let newline = buffer.find_byte(b'\n')?;
    let mut line = buffer.split_to(newline + 1);
    line.truncate(newline);
    if line.last() == Some(&b'\r') {
        line.truncate(newline - 1);
    }
    Some(line.freeze())
}
