// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running a single test file as a child process.

mod imp;

pub use imp::*;
