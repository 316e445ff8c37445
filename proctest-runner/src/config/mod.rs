// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for proctest.
//!
//! The main structure in this module is [`HarnessConfig`].

mod imp;
mod parallelism;

pub use imp::*;
pub use parallelism::*;
