// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for proctest, a harness that runs test files as child processes and
//! aggregates what they report.
//!
//! The basic flow of a run:
//!
//! 1. [`config::HarnessConfig`] describes the executables, the registered test files and the
//!    number of processes.
//! 2. [`list::TestRegistry`] loads the test files and resolves a label expression into the files
//!    to run.
//! 3. [`runner::Harness`] runs those files on a pool of [`runner::Launcher`]s. Each launcher
//!    drives a [`process::ChildProcess`] and feeds its output through a [`decoder::EventDecoder`].
//! 4. Every decoded event goes to a [`reporter::OutputSink`], and the statistics gathered along
//!    the way decide whether the run succeeded.
//!
//! [`suite::TestSuite`] wraps these steps up.

pub mod config;
pub mod decoder;
pub mod errors;
pub mod executable;
mod helpers;
pub mod list;
pub mod process;
pub mod reporter;
pub mod runner;
mod stopwatch;
pub mod suite;

pub use helpers::plural;
