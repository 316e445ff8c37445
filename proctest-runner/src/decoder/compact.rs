// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::EventDecoder;
use crate::reporter::OutputSink;
use bstr::ByteSlice;
use bytes::{Buf, BytesMut};
use proctest_metadata::Frame;
use tracing::trace;

/// Decodes the compact format: one JSON record per line.
///
/// A line that doesn't decode stops the pass and stays at the front of the buffer, so nothing
/// after it is emitted until it does. Records written by
/// [`FrameWriter`](proctest_metadata::FrameWriter) never contain a raw newline, so a complete
/// line that fails to decode is garbage, and is what the launcher reports once the process
/// closes.
///
/// `focus`, `close` and `flush` records are bookkeeping of the producer and are consumed without
/// being forwarded.
#[derive(Debug, Default)]
pub struct CompactDecoder {
    buffer: BytesMut,
}

impl CompactDecoder {
    /// Creates a new decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventDecoder for CompactDecoder {
    fn parse(&mut self, chunk: &[u8], sink: &mut dyn OutputSink) {
        self.buffer.extend_from_slice(chunk);

        while let Some(newline) = self.buffer.find_byte(b'\n') {
            let line = self.buffer[..newline].trim_end_with(|c| c == '\r');
            if line.trim().is_empty() {
                self.buffer.advance(newline + 1);
                continue;
            }

            let frame = match line.to_str() {
                Ok(line) => Frame::decode(line),
                Err(err) => {
                    trace!(%err, "compact record is not valid UTF-8, waiting for more data");
                    break;
                }
            };
            let frame = match frame {
                Ok(frame) => frame,
                Err(err) => {
                    trace!(%err, "compact record did not decode, waiting for more data");
                    break;
                }
            };

            self.buffer.advance(newline + 1);
            match frame.into_event() {
                Some(event) => sink.event(event),
                None => trace!("consumed producer bookkeeping record"),
            }
        }
    }

    fn done(&self) -> bool {
        self.buffer.is_empty()
    }

    fn remaining(&self) -> &[u8] {
        &self.buffer
    }
}
