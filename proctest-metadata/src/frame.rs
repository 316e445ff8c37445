// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The compact wire format.
//!
//! Each record is a single line of JSON of the form `["<method>", [<args>...]]`. JSON escapes
//! newlines and carriage returns inside strings, so an encoded record never spans more than one
//! line. That is what lets a reader treat "no complete line yet" and "line does not decode yet"
//! the same way: wait for more data.

use crate::{ErrorRecord, Event, FrameDecodeError};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// A decoded compact record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Frame {
    /// A test event.
    Event(Event),

    /// The producer started reporting on the given file.
    Focus {
        /// The file path.
        path: String,
    },

    /// The producer finished reporting on the current file.
    Close,

    /// The producer finished reporting entirely.
    Flush,
}

impl Frame {
    /// Methods that are bookkeeping for the producer rather than test outcomes.
    pub const SUPPRESSED_METHODS: &'static [&'static str] = &["focus", "close", "flush"];

    /// Returns the method name for this frame.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Event(event) => event.method(),
            Self::Focus { .. } => "focus",
            Self::Close => "close",
            Self::Flush => "flush",
        }
    }

    /// Returns true if this frame is producer bookkeeping, not a test event.
    pub fn is_suppressed(&self) -> bool {
        !matches!(self, Self::Event(_))
    }

    /// Returns the event carried by this frame, if any.
    pub fn into_event(self) -> Option<Event> {
        match self {
            Self::Event(event) => Some(event),
            Self::Focus { .. } | Self::Close | Self::Flush => None,
        }
    }

    /// Encodes this frame as a single line, without the trailing newline.
    pub fn encode(&self) -> String {
        let args = match self {
            Self::Event(Event::Plan(count)) => json!([count]),
            Self::Event(Event::Pass { message }) => json!([message]),
            Self::Event(Event::Fail { message, error }) => json!([message, error]),
            Self::Event(Event::Skip { message, reason }) => json!([message, reason]),
            Self::Event(Event::Todo { message }) => json!([message]),
            Self::Event(Event::Warning {
                message,
                file,
                line,
            }) => json!([message, file, line]),
            Self::Event(Event::Error(error)) => json!([error]),
            Self::Event(Event::Comment { message }) => json!([message]),
            Self::Focus { path } => json!([path]),
            Self::Close | Self::Flush => json!([]),
        };
        json!([self.method(), args]).to_string()
    }

    /// Decodes a single line (with or without its trailing newline).
    pub fn decode(line: &str) -> Result<Self, FrameDecodeError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let value: Value = serde_json::from_str(line).map_err(FrameDecodeError::Json)?;

        let (method, args) = match value {
            Value::Array(mut pair) if pair.len() == 2 => {
                let args = pair.pop();
                let method = pair.pop();
                match (method, args) {
                    (Some(Value::String(method)), Some(Value::Array(args))) => (method, args),
                    _ => return Err(FrameDecodeError::NotARecord),
                }
            }
            _ => return Err(FrameDecodeError::NotARecord),
        };

        let frame = match method.as_str() {
            "plan" => {
                let args = Args::new("plan", args);
                Self::Event(Event::Plan(args.required(0)?))
            }
            "pass" => {
                let args = Args::new("pass", args);
                Self::Event(Event::Pass {
                    message: args.string_or_default(0)?,
                })
            }
            "fail" => {
                let args = Args::new("fail", args);
                Self::Event(Event::Fail {
                    message: args.string_or_default(0)?,
                    error: args.optional::<ErrorRecord>(1)?,
                })
            }
            "skip" => {
                let args = Args::new("skip", args);
                Self::Event(Event::Skip {
                    message: args.string_or_default(0)?,
                    reason: args.string_or_default(1)?,
                })
            }
            "todo" => {
                let args = Args::new("todo", args);
                Self::Event(Event::Todo {
                    message: args.string_or_default(0)?,
                })
            }
            "warning" => {
                let args = Args::new("warning", args);
                Self::Event(Event::Warning {
                    message: args.required(0)?,
                    file: args.string_or_default(1)?,
                    line: args.optional(2)?.unwrap_or(0),
                })
            }
            "error" => {
                let args = Args::new("error", args);
                Self::Event(Event::Error(args.required(0)?))
            }
            "comment" => {
                let args = Args::new("comment", args);
                Self::Event(Event::Comment {
                    message: args.string_or_default(0)?,
                })
            }
            "focus" => {
                let args = Args::new("focus", args);
                Self::Focus {
                    path: args.string_or_default(0)?,
                }
            }
            "close" => Self::Close,
            "flush" => Self::Flush,
            _ => return Err(FrameDecodeError::UnknownMethod { method }),
        };

        Ok(frame)
    }
}

impl From<Event> for Frame {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

/// Positional arguments of a record.
struct Args {
    method: &'static str,
    values: Vec<Value>,
}

impl Args {
    fn new(method: &'static str, values: Vec<Value>) -> Self {
        Self { method, values }
    }

    fn required<T: DeserializeOwned>(&self, index: usize) -> Result<T, FrameDecodeError> {
        match self.values.get(index) {
            Some(value) => self.deserialize(index, value),
            None => Err(FrameDecodeError::MissingArgument {
                method: self.method,
                index,
            }),
        }
    }

    fn optional<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, FrameDecodeError> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.deserialize(index, value).map(Some),
        }
    }

    fn string_or_default(&self, index: usize) -> Result<String, FrameDecodeError> {
        Ok(self.optional(index)?.unwrap_or_default())
    }

    fn deserialize<T: DeserializeOwned>(
        &self,
        index: usize,
        value: &Value,
    ) -> Result<T, FrameDecodeError> {
        T::deserialize(value).map_err(|err| FrameDecodeError::InvalidArgument {
            method: self.method,
            index,
            err,
        })
    }
}
