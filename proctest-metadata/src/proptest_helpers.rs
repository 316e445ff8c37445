// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strategies for generating events. Enabled with the `proptest1` feature.

use crate::{ErrorRecord, Event, Frame, TraceFrame};
use proptest::{collection::vec, option, prelude::*};

/// Generates an arbitrary [`TraceFrame`].
pub fn arb_trace_frame() -> impl Strategy<Value = TraceFrame> {
    (
        option::of(any::<String>()),
        option::of(any::<u32>()),
        any::<String>(),
    )
        .prop_map(|(file, line, function)| TraceFrame {
            file,
            line,
            function,
        })
}

/// Generates an arbitrary [`ErrorRecord`].
pub fn arb_error_record() -> impl Strategy<Value = ErrorRecord> {
    (
        prop_oneof![
            Just(ErrorRecord::ERROR.to_owned()),
            Just(ErrorRecord::WARNING.to_owned()),
            any::<String>(),
        ],
        any::<String>(),
        any::<String>(),
        any::<u32>(),
        vec(arb_trace_frame(), 0..3),
        vec(any::<String>(), 0..3),
    )
        .prop_map(
            |(kind, message, file, line, trace, invocation_trace)| ErrorRecord {
                kind,
                message,
                file,
                line,
                trace,
                invocation_trace,
            },
        )
}

/// Generates an arbitrary [`Event`].
pub fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        any::<usize>().prop_map(Event::Plan),
        any::<String>().prop_map(|message| Event::pass(message)),
        (any::<String>(), option::of(arb_error_record()))
            .prop_map(|(message, error)| Event::Fail { message, error }),
        (any::<String>(), any::<String>()).prop_map(|(message, reason)| Event::skip(message, reason)),
        any::<String>().prop_map(|message| Event::todo(message)),
        (any::<String>(), any::<String>(), any::<u32>())
            .prop_map(|(message, file, line)| Event::warning(message, file, line)),
        arb_error_record().prop_map(Event::Error),
        any::<String>().prop_map(|message| Event::comment(message)),
    ]
}

/// Generates an arbitrary [`Frame`], mostly carrying events.
pub fn arb_frame() -> impl Strategy<Value = Frame> {
    prop_oneof![
        8 => arb_event().prop_map(Frame::Event),
        1 => any::<String>().prop_map(|path| Frame::Focus { path }),
        1 => Just(Frame::Close),
        1 => Just(Frame::Flush),
    ]
}
