// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;

/// A named collection of test files, keyed by path.
///
/// Membership is decided by path alone: two files with the same path are the same member, no
/// matter how they were registered. Iteration order is insertion order, and the set operations
/// keep the order of the left-hand side, appending new members from the right-hand side.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Label {
    paths: IndexSet<Utf8PathBuf>,
}

impl Label {
    /// Creates a new, empty label.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path to the label. Returns false if it was already a member.
    pub fn add_path(&mut self, path: impl Into<Utf8PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    /// Returns true if the path is a member of this label.
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.contains(path)
    }

    /// Iterates over the member paths in order.
    pub fn paths(&self) -> impl ExactSizeIterator<Item = &Utf8Path> + '_ {
        self.paths.iter().map(|path| path.as_path())
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if the label has no members.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Returns the files present in both `self` and `other`.
    pub fn intersect(&self, other: &Label) -> Label {
        self.paths
            .iter()
            .filter(|path| other.paths.contains(*path))
            .cloned()
            .collect()
    }

    /// Returns the files present in `self` or `other`.
    pub fn union(&self, other: &Label) -> Label {
        self.paths.iter().chain(&other.paths).cloned().collect()
    }

    /// Returns the files present in `self` but not in `other`.
    pub fn subtract(&self, other: &Label) -> Label {
        self.paths
            .iter()
            .filter(|path| !other.paths.contains(*path))
            .cloned()
            .collect()
    }
}

impl<P: Into<Utf8PathBuf>> FromIterator<P> for Label {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<P: Into<Utf8PathBuf>> Extend<P> for Label {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.paths.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn label(paths: &[&str]) -> Label {
        paths.iter().copied().collect()
    }

    #[test]
    fn duplicates_are_filtered() {
        let mut label = label(&["test1.t", "test2.t"]);
        assert!(!label.add_path("test1.t"));
        assert!(label.add_path("test3.t"));
        assert_eq!(
            label.paths().map(|path| path.as_str()).collect::<Vec<_>>(),
            vec!["test1.t", "test2.t", "test3.t"]
        );
    }

    #[test]
    fn set_operations() {
        let label1 = label(&["test1.t", "test2.t"]);
        let label2 = label(&["test1.t", "test3.t"]);

        assert_eq!(label1.intersect(&label2), label(&["test1.t"]));
        assert_eq!(
            label1.union(&label2),
            label(&["test1.t", "test2.t", "test3.t"])
        );
        assert_eq!(label1.subtract(&label2), label(&["test2.t"]));
    }

    #[test]
    fn operations_keep_left_order() {
        let left = label(&["c.t", "a.t", "b.t"]);
        let right = label(&["d.t", "b.t", "c.t"]);

        let union: Vec<_> = left.union(&right).paths().map(ToString::to_string).collect();
        assert_eq!(union, vec!["c.t", "a.t", "b.t", "d.t"]);

        let intersection: Vec<_> = left
            .intersect(&right)
            .paths()
            .map(ToString::to_string)
            .collect();
        assert_eq!(intersection, vec!["c.t", "b.t"]);
    }

    #[test]
    fn operations_with_empty() {
        let full = label(&["a.t", "b.t"]);
        let empty = Label::new();
        assert!(full.intersect(&empty).is_empty());
        assert_eq!(full.union(&empty), full);
        assert_eq!(full.subtract(&empty), full);
        assert!(empty.subtract(&full).is_empty());
    }
}
