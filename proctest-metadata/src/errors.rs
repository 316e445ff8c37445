// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurred while decoding a compact frame.
///
/// Decode errors are usually transient: a line that does not decode yet may only be the first
/// part of a record that is still being written.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameDecodeError {
    /// The line is not valid JSON.
    #[error("frame is not valid JSON")]
    Json(#[source] serde_json::Error),

    /// The line is valid JSON but not a `[method, [args...]]` pair.
    #[error("frame is not a [method, arguments] pair")]
    NotARecord,

    /// The method name is not known.
    #[error("unknown frame method `{method}`")]
    UnknownMethod {
        /// The method name found in the frame.
        method: String,
    },

    /// A required argument was missing.
    #[error("frame method `{method}` is missing argument {index}")]
    MissingArgument {
        /// The method name.
        method: &'static str,
        /// The zero-based argument position.
        index: usize,
    },

    /// An argument had the wrong shape.
    #[error("frame method `{method}` has an invalid argument {index}")]
    InvalidArgument {
        /// The method name.
        method: &'static str,
        /// The zero-based argument position.
        index: usize,
        /// The underlying error.
        #[source]
        err: serde_json::Error,
    },
}
