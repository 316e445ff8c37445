// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Shared vocabulary between the proctest harness and the test files it runs.
//!
//! A test file reports its progress as a stream of [`Event`]s. Producers written in Rust can use
//! [`FrameWriter`] to emit events in the compact wire format, one JSON record per line:
//!
//! ```text
//! ["plan",[2]]
//! ["pass",["addition works"]]
//! ["fail",["subtraction works",null]]
//! ```
//!
//! The harness reads these lines back with [`Frame::decode`].

mod errors;
mod event;
mod exit_codes;
mod frame;
#[cfg(any(test, feature = "proptest1"))]
mod proptest_helpers;
mod writer;

pub use errors::*;
pub use event::*;
pub use exit_codes::*;
pub use frame::*;
#[cfg(feature = "proptest1")]
pub use proptest_helpers::*;
pub use writer::*;
