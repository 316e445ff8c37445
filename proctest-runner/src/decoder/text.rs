// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{EventDecoder, split_line};
use crate::reporter::OutputSink;
use bstr::ByteSlice;
use bytes::BytesMut;
use proctest_metadata::Event;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

static PLAN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1\.\.(\d+)").expect("plan regex is valid"));

static RESULT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(not )?ok \d+(?: - (.+?))?(?: # (SKIP|TODO)(?: (.*))?)?$")
        .expect("result regex is valid")
});

/// Decodes Test Anything Protocol style output, one line at a time.
///
/// Recognized lines are plans (`1..N`) and results (`ok 1 - message`, `not ok 2 # SKIP reason`).
/// Every other line is free-form commentary and is dropped.
#[derive(Debug, Default)]
pub struct TextDecoder {
    buffer: BytesMut,
}

impl TextDecoder {
    /// Creates a new decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_line(line: &str, sink: &mut dyn OutputSink) {
        if let Some(captures) = PLAN_LINE.captures(line) {
            match captures[1].parse() {
                Ok(count) => sink.event(Event::Plan(count)),
                Err(err) => trace!(%err, line, "ignoring plan line with an out of range count"),
            }
            return;
        }

        let Some(captures) = RESULT_LINE.captures(line) else {
            return;
        };
        let not_ok = captures.get(1).is_some();
        let message = captures.get(2).map_or("", |m| m.as_str());
        let directive = captures.get(3).map(|m| m.as_str());

        match directive {
            Some("SKIP") => {
                let reason = captures.get(4).map_or("", |m| m.as_str().trim());
                sink.event(Event::skip(message, reason));
                if not_ok {
                    sink.event(Event::warning(
                        "Skipped tests are expected to have status \"ok\"",
                        "",
                        0,
                    ));
                }
            }
            Some(_) => {
                sink.event(Event::todo(message));
                if !not_ok {
                    sink.event(Event::warning(
                        "TODOs are expected to have status \"not ok\"",
                        "",
                        0,
                    ));
                }
            }
            None if not_ok => sink.event(Event::fail(message)),
            None => sink.event(Event::pass(message)),
        }
    }
}

impl EventDecoder for TextDecoder {
    fn parse(&mut self, chunk: &[u8], sink: &mut dyn OutputSink) {
        self.buffer.extend_from_slice(chunk);

        while let Some(line) = split_line(&mut self.buffer) {
            Self::parse_line(&line.to_str_lossy(), sink);
        }
    }

    fn done(&self) -> bool {
        self.buffer.is_empty()
    }

    fn remaining(&self) -> &[u8] {
        &self.buffer
    }
}
