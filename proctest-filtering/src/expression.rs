// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    Label,
    errors::{LabelParseError, UnknownLabelError},
};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    hash::BuildHasher,
    str::FromStr,
};

/// How a label token combines with the selection built so far.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LabelOp {
    /// A bare name: keep only files that carry the label.
    Intersect,

    /// `+name`: add every file that carries the label.
    Union,

    /// `-name`: remove every file that carries the label.
    Subtract,
}

impl LabelOp {
    fn prefix(self) -> &'static str {
        match self {
            Self::Intersect => "",
            Self::Union => "+",
            Self::Subtract => "-",
        }
    }
}

/// A single label token, such as `unit`, `+smoke` or `-slow`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct LabelToken {
    /// The operator.
    pub op: LabelOp,

    /// The label name, without the operator prefix.
    pub name: String,
}

impl FromStr for LabelToken {
    type Err = LabelParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (op, name) = if let Some(name) = token.strip_prefix('+') {
            (LabelOp::Union, name)
        } else if let Some(name) = token.strip_prefix('-') {
            (LabelOp::Subtract, name)
        } else {
            (LabelOp::Intersect, token)
        };

        if name.is_empty() {
            return Err(LabelParseError::EmptyName {
                token: token.to_owned(),
            });
        }
        if name.contains(char::is_whitespace) {
            return Err(LabelParseError::Whitespace {
                token: token.to_owned(),
            });
        }

        Ok(Self {
            op,
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for LabelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.prefix(), self.name)
    }
}

/// Looks up labels by name.
pub trait LabelLookup {
    /// Returns the label with the given name, if it exists.
    fn label(&self, name: &str) -> Option<&Label>;

    /// Returns the names of every known label, for error messages.
    fn label_names(&self) -> Vec<String>;
}

impl LabelLookup for indexmap::IndexMap<String, Label> {
    fn label(&self, name: &str) -> Option<&Label> {
        self.get(name)
    }

    fn label_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl LabelLookup for BTreeMap<String, Label> {
    fn label(&self, name: &str) -> Option<&Label> {
        self.get(name)
    }

    fn label_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl<S: BuildHasher> LabelLookup for HashMap<String, Label, S> {
    fn label(&self, name: &str) -> Option<&Label> {
        self.get(name)
    }

    fn label_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

/// An ordered list of label tokens.
///
/// Evaluation is a strict left fold over the tokens, starting from the set of all files. There is
/// no operator precedence: `a -b +c` is `((all ∩ a) − b) ∪ c`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelExpression {
    tokens: Vec<LabelToken>,
}

impl LabelExpression {
    /// Parses a sequence of tokens, as given on a command line.
    pub fn parse<I, S>(tokens: I) -> Result<Self, LabelParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .map(|token| token.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    /// Creates an expression from already-parsed tokens.
    pub fn from_tokens(tokens: Vec<LabelToken>) -> Self {
        Self { tokens }
    }

    /// Returns the tokens in this expression.
    pub fn tokens(&self) -> &[LabelToken] {
        &self.tokens
    }

    /// Returns true if this expression has no tokens, and so selects everything.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Evaluates the expression against `universe`, the set of all files.
    ///
    /// Every referenced label must exist in `labels`, even if the running selection is already
    /// empty by the time it's reached.
    pub fn evaluate(
        &self,
        universe: &Label,
        labels: &impl LabelLookup,
    ) -> Result<Label, UnknownLabelError> {
        self.tokens
            .iter()
            .try_fold(universe.clone(), |selection, token| {
                let label = labels
                    .label(&token.name)
                    .ok_or_else(|| UnknownLabelError::new(&token.name, labels.label_names()))?;
                Ok(match token.op {
                    LabelOp::Intersect => selection.intersect(label),
                    LabelOp::Union => selection.union(label),
                    LabelOp::Subtract => selection.subtract(label),
                })
            })
    }
}

impl fmt::Display for LabelExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}
