// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::executable::Executable;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use std::sync::Arc;

/// A single test file: a path, and the executable that runs it.
#[derive(Clone, Debug)]
pub struct TestFile {
    path: Utf8PathBuf,
    name: String,
    executable: Arc<Executable>,
    labels: IndexSet<String>,
}

impl TestFile {
    /// Creates a new test file. Its name is the final component of `path`.
    pub fn new(path: impl Into<Utf8PathBuf>, executable: Arc<Executable>) -> Self {
        let path = path.into();
        let name = path.file_name().unwrap_or(path.as_str()).to_owned();
        Self::with_name(path, name, executable)
    }

    /// Creates a new test file with an explicit name.
    pub fn with_name(
        path: impl Into<Utf8PathBuf>,
        name: impl Into<String>,
        executable: Arc<Executable>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            executable,
            labels: IndexSet::new(),
        }
    }

    /// The path of the file. Files loaded through a registry have canonical paths.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The name of the file: its final path component, without the test suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The executable that runs this file.
    pub fn executable(&self) -> &Arc<Executable> {
        &self.executable
    }

    /// The labels of this file, in the order they were added.
    pub fn labels(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.labels.iter().map(String::as_str)
    }

    /// Returns true if this file has the label `name`.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    /// Adds a label. Returns false if the file already had it.
    pub fn add_label(&mut self, name: impl Into<String>) -> bool {
        self.labels.insert(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecoderKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_are_deduplicated() {
        let executable = Arc::new(Executable::new("sh", "sh", DecoderKind::Text).unwrap());
        let mut file = TestFile::new("/t/unit/math.t", executable);
        assert_eq!(file.name(), "math.t");

        assert!(file.add_label("unit"));
        assert!(file.add_label("fast"));
        assert!(!file.add_label("unit"));
        assert_eq!(file.labels().collect::<Vec<_>>(), vec!["unit", "fast"]);
        assert!(file.has_label("fast"));
        assert!(!file.has_label("slow"));
    }
}
