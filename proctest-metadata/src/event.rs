// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single outcome reported by a running test file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// The test file announced how many tests it is going to run.
    Plan(usize),

    /// A test passed.
    Pass {
        /// The test description, possibly empty.
        message: String,
    },

    /// A test failed.
    Fail {
        /// The test description, possibly empty.
        message: String,
        /// Details about the failure, if the producer supplied any.
        error: Option<ErrorRecord>,
    },

    /// A test was skipped. Skipped tests count as passed.
    Skip {
        /// The test description, possibly empty.
        message: String,
        /// Why the test was skipped, possibly empty.
        reason: String,
    },

    /// A test is not implemented yet. Todos count as passed.
    Todo {
        /// The test description, possibly empty.
        message: String,
    },

    /// A non-fatal problem was noticed while running the test file.
    Warning {
        /// The warning text.
        message: String,
        /// The file the warning refers to, possibly empty.
        file: String,
        /// The line the warning refers to, or 0 if unknown.
        line: u32,
    },

    /// An error occurred outside of any single test.
    Error(ErrorRecord),

    /// Free-form commentary.
    Comment {
        /// The comment text.
        message: String,
    },
}

impl Event {
    /// Creates a new [`Event::Pass`].
    pub fn pass(message: impl Into<String>) -> Self {
        Self::Pass {
            message: message.into(),
        }
    }

    /// Creates a new [`Event::Fail`] without error details.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
            error: None,
        }
    }

    /// Creates a new [`Event::Skip`].
    pub fn skip(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Skip {
            message: message.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new [`Event::Todo`].
    pub fn todo(message: impl Into<String>) -> Self {
        Self::Todo {
            message: message.into(),
        }
    }

    /// Creates a new [`Event::Warning`].
    pub fn warning(message: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self::Warning {
            message: message.into(),
            file: file.into(),
            line,
        }
    }

    /// Creates a new [`Event::Comment`].
    pub fn comment(message: impl Into<String>) -> Self {
        Self::Comment {
            message: message.into(),
        }
    }

    /// Returns the wire-level method name for this event.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Plan(_) => "plan",
            Self::Pass { .. } => "pass",
            Self::Fail { .. } => "fail",
            Self::Skip { .. } => "skip",
            Self::Todo { .. } => "todo",
            Self::Warning { .. } => "warning",
            Self::Error(_) => "error",
            Self::Comment { .. } => "comment",
        }
    }
}

/// Details about an error raised by a test file, or synthesized by the harness.
///
/// Traces are owned snapshots: frames are plain data, never references back into the producer.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorRecord {
    /// The error type, for example `"Error"`, `"Warning"` or `"Fatal error"`.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    /// The error message.
    pub message: String,

    /// The file where the error occurred, possibly empty.
    #[serde(default)]
    pub file: String,

    /// The line where the error occurred, or 0 if unknown.
    #[serde(default)]
    pub line: u32,

    /// The call stack at the point of the error, innermost frame first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceFrame>,

    /// A human-readable log of the calls that led up to the error.
    ///
    /// This is filled in by collaborators such as mock-object frameworks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invocation_trace: Vec<String>,
}

fn default_kind() -> String {
    ErrorRecord::ERROR.to_owned()
}

impl ErrorRecord {
    /// The default error type.
    pub const ERROR: &'static str = "Error";

    /// The error type used for diagnostics that do not originate from a failed assertion, such
    /// as stderr noise.
    pub const WARNING: &'static str = "Warning";

    /// Creates a new error record of type [`ErrorRecord::ERROR`].
    pub fn new(message: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            kind: Self::ERROR.to_owned(),
            message: message.into(),
            file: file.into(),
            line,
            trace: Vec::new(),
            invocation_trace: Vec::new(),
        }
    }

    /// Sets the error type.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Sets the call stack.
    pub fn with_trace(mut self, trace: impl IntoIterator<Item = TraceFrame>) -> Self {
        self.trace = trace.into_iter().collect();
        self
    }

    /// Sets the invocation trace.
    pub fn with_invocation_trace(
        mut self,
        invocation_trace: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.invocation_trace = invocation_trace.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if this record is of type [`ErrorRecord::WARNING`].
    pub fn is_warning(&self) -> bool {
        self.kind == Self::WARNING
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if !self.file.is_empty() {
            write!(f, " (in {} on line {})", self.file, self.line)?;
        }
        Ok(())
    }
}

/// One frame of an [`ErrorRecord`] call stack.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct TraceFrame {
    /// The source file of the frame, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// The line within `file`, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// The function or method name, qualified as the producer sees fit.
    pub function: String,
}

impl TraceFrame {
    /// Creates a new frame for a function at a known location.
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
            function: function.into(),
        }
    }

    /// Creates a new frame for a function without location information.
    pub fn internal(function: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            function: function.into(),
        }
    }
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}() at {file}:{line}", self.function),
            _ => write!(f, "{}() at [internal function]", self.function),
        }
    }
}
