// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The scheduler: launchers that each drive one test file, and the harness that feeds them.

mod harness;
mod launcher;

pub use harness::*;
pub use launcher::*;
