// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovering test files and selecting them by label.

mod registry;
mod source;
mod test_file;

pub use registry::*;
pub use source::*;
pub use test_file::*;
