// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by proctest.
//!
//! Problems inside a running test file (undecodable output, stderr noise, failure to spawn) are
//! not errors at this level: they are reported as events. Only configuration, discovery and
//! selection can fail.

use crate::config::HarnessConfig;
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use proctest_filtering::errors::{LabelParseError, UnknownLabelError};
use std::io;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse proctest config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// An executable definition was invalid.
    #[error("invalid definition for executable `{name}`")]
    InvalidExecutable {
        /// The name of the executable.
        name: String,

        /// The underlying error.
        #[source]
        err: ExecutableParseError,
    },

    /// A name referred to an executable that isn't defined.
    #[error(
        "{context} refers to unknown executable `{name}` (known executables: {})",
        known_or_none(.known)
    )]
    UnknownExecutable {
        /// Where the reference was made.
        context: String,

        /// The name that wasn't found.
        name: String,

        /// The executables that are defined.
        known: Vec<String>,
    },

    /// A registration didn't name an executable, and no default executable is configured.
    #[error("register entry {index} has no `executable` and no `default-executable` is set")]
    NoExecutable {
        /// The zero-based index of the registration.
        index: usize,
    },

    /// A registration didn't specify exactly one source.
    #[error("register entry {index} must have exactly one of `file`, `dir` or `glob` (found {found})")]
    InvalidRegistration {
        /// The zero-based index of the registration.
        index: usize,

        /// The number of sources found.
        found: usize,
    },
}

fn known_or_none(known: &[String]) -> String {
    if known.is_empty() {
        "none".to_owned()
    } else {
        known.join(", ")
    }
}

/// No config file was found while searching parent directories.
#[derive(Clone, Debug, Error)]
#[error(
    "could not find `{}` in `{start_dir}` or any parent directory",
    HarnessConfig::CONFIG_PATH
)]
pub struct ConfigDiscoveryError {
    start_dir: Utf8PathBuf,
}

impl ConfigDiscoveryError {
    pub(crate) fn new(start_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
        }
    }

    /// Returns the directory the search started from.
    pub fn start_dir(&self) -> &Utf8Path {
        &self.start_dir
    }
}

/// An error that occurred while discovering and loading the config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigLoadError {
    /// No config file was found.
    #[error(transparent)]
    Discovery(#[from] ConfigDiscoveryError),

    /// A config file was found but failed to parse.
    #[error(transparent)]
    Parse(#[from] ConfigParseError),
}

/// An error that occurred while parsing an executable's command template.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ExecutableParseError {
    /// The command was empty.
    #[error("command is empty")]
    EmptyCommand,

    /// The command couldn't be split into words.
    #[error("command `{command}` has unbalanced quotes")]
    InvalidQuoting {
        /// The command as given.
        command: String,
    },
}

/// Error returned while parsing a [`DecoderKind`](crate::decoder::DecoderKind) from a string.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unrecognized decoder `{input}` (known decoders: compact, text)")]
pub struct DecoderKindParseError {
    input: String,
}

impl DecoderKindParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurs while parsing a [`Parallelism`](crate::config::Parallelism) value.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unrecognized value for processes: {input}")]
pub struct ParallelismParseError {
    input: String,
}

impl ParallelismParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurred while loading test files from a source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// A registered file or directory doesn't exist.
    #[error("`{path}` does not exist")]
    NotFound {
        /// The path.
        path: Utf8PathBuf,
    },

    /// A path couldn't be canonicalized.
    #[error("error canonicalizing `{path}`")]
    Canonicalize {
        /// The path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// A path wasn't valid UTF-8.
    #[error("path `{}` is not valid UTF-8", .path.display())]
    NonUtf8Path {
        /// The path.
        path: std::path::PathBuf,
    },

    /// An error occurred while walking a directory.
    #[error("error walking `{root}`")]
    Walk {
        /// The directory being walked.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: walkdir::Error,
    },

    /// A glob pattern was invalid.
    #[error("invalid glob pattern `{pattern}`")]
    InvalidGlob {
        /// The pattern.
        pattern: String,

        /// The underlying error.
        #[source]
        err: globset::Error,
    },
}

/// An error that occurred while resolving a label expression.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum SelectError {
    /// A token couldn't be parsed.
    #[error(transparent)]
    Parse(#[from] LabelParseError),

    /// A token named a label that doesn't exist.
    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabelError),
}

/// An error that prevented a test suite from running.
///
/// These are all reported before any test file is launched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The config couldn't be loaded.
    #[error(transparent)]
    Config(#[from] ConfigParseError),

    /// Test files couldn't be loaded.
    #[error("error loading test files")]
    Load(#[from] LoadError),

    /// The label expression couldn't be resolved.
    #[error("error selecting test files")]
    Select(#[from] SelectError),

    /// The label expression resolved to no files.
    #[error("no test files selected{}", selection_suffix(.expression))]
    NoTestsSelected {
        /// The label expression, or empty if none was given.
        expression: String,
    },
}

fn selection_suffix(expression: &str) -> String {
    if expression.is_empty() {
        String::new()
    } else {
        format!(" by `{expression}`")
    }
}
