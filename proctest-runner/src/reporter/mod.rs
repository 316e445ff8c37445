// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consumers of test events.
//!
//! The harness delivers events to an [`OutputSink`]. Rendering results is left to sink
//! implementations; this module provides the contract, a [`SuiteAggregator`] that computes
//! [`SuiteStatistics`] and decides success, and a few simple sinks.

mod aggregator;
mod sink;
mod statistics;

pub use aggregator::*;
pub use sink::*;
pub use statistics::*;
