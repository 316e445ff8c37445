// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command templates for running test files.

use crate::{decoder::DecoderKind, errors::ExecutableParseError};
use camino::Utf8Path;
use std::fmt;

/// Describes how to run a test file, and how to read what it prints.
///
/// An executable is a command template plus the decoder used for the output of the processes it
/// spawns. It is shared by every test file registered with it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Executable {
    name: String,
    args: Vec<String>,
    decoder: DecoderKind,
}

impl Executable {
    /// The placeholder substituted with the test file's path.
    pub const FILE_PLACEHOLDER: &'static str = "%file%";

    /// Creates a new executable from a command line, split into words with shell rules.
    ///
    /// If no word contains [`Self::FILE_PLACEHOLDER`], the test file's path is passed as the last
    /// argument.
    pub fn new(
        name: impl Into<String>,
        command: &str,
        decoder: DecoderKind,
    ) -> Result<Self, ExecutableParseError> {
        let args =
            shell_words::split(command).map_err(|_| ExecutableParseError::InvalidQuoting {
                command: command.to_owned(),
            })?;
        Self::from_args(name, args, decoder)
    }

    /// Creates a new executable from a command that is already split into words.
    pub fn from_args(
        name: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
        decoder: DecoderKind,
    ) -> Result<Self, ExecutableParseError> {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(ExecutableParseError::EmptyCommand);
        }
        Ok(Self {
            name: name.into(),
            args,
            decoder,
        })
    }

    /// Returns the name this executable was registered with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the command template.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the decoder for the output of this executable's processes.
    pub fn decoder(&self) -> DecoderKind {
        self.decoder
    }

    /// Returns the command line used to run the test file at `path`. The first element is the
    /// program.
    pub fn command_for(&self, path: &Utf8Path) -> Vec<String> {
        let mut substituted = false;
        let mut command: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(Self::FILE_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(Self::FILE_PLACEHOLDER, path.as_str())
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            command.push(path.to_string());
        }
        command
    }
}

impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", shell_words::join(&self.args), self.decoder)
    }
}
