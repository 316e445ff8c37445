// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests
//!
//! These tests run real child processes. Test files are scripts for the `emit-frames` helper
//! binary, which writes compact frames and raw output as instructed, so each test controls
//! exactly what a test file prints and when.

mod fixtures;
mod harness;
mod launcher;
mod suite;
