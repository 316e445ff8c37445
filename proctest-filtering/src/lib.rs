// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Label algebra for selecting test files.
//!
//! Test files are grouped into named [`Label`]s. A [`LabelExpression`] is an ordered list of label
//! tokens, each optionally prefixed with `+` (union) or `-` (subtract); a bare name intersects.
//! Tokens are folded strictly left to right starting from the set of every registered file, so
//! `unit -slow +smoke` selects `((all ∩ unit) − slow) ∪ smoke`.

pub mod errors;
mod expression;
mod label;

pub use expression::{LabelExpression, LabelLookup, LabelOp, LabelToken};
pub use label::Label;
