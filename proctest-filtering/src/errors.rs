// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while parsing and evaluating label expressions.

use std::fmt;
use thiserror::Error;

/// An error that occurred while parsing a label token.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum LabelParseError {
    /// The token had no label name after its operator.
    #[error("label token `{token}` has no name")]
    EmptyName {
        /// The token as given.
        token: String,
    },

    /// The token contained whitespace.
    #[error("label token `{token}` contains whitespace")]
    Whitespace {
        /// The token as given.
        token: String,
    },
}

/// A label expression referenced a label that doesn't exist.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown label `{name}` ({})", KnownLabels(.known))]
pub struct UnknownLabelError {
    name: String,
    known: Vec<String>,
}

impl UnknownLabelError {
    pub(crate) fn new(name: impl Into<String>, mut known: Vec<String>) -> Self {
        known.sort_unstable();
        Self {
            name: name.into(),
            known,
        }
    }

    /// Returns the name of the label that wasn't found.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the names of the labels that do exist, sorted.
    pub fn known(&self) -> &[String] {
        &self.known
    }
}

struct KnownLabels<'a>(&'a [String]);

impl fmt::Display for KnownLabels<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "no labels are defined")
        } else {
            write!(f, "known labels: {}", self.0.join(", "))
        }
    }
}
