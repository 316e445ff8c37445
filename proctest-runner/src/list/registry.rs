// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Loadable, TestFile};
use crate::{
    config::HarnessConfig,
    errors::{LoadError, SelectError},
    executable::Executable,
    helpers::plural,
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use proctest_filtering::{Label, LabelExpression};
use std::sync::Arc;
use tracing::debug;

/// Every known test file, and the labels that group them.
///
/// A path registered more than once keeps the test file (and executable) from its first
/// registration; later registrations only add labels.
#[derive(Clone, Debug)]
pub struct TestRegistry {
    suffix: String,
    files: IndexMap<Utf8PathBuf, TestFile>,
    labels: IndexMap<String, Label>,
}

impl TestRegistry {
    /// Creates an empty registry. `suffix` identifies test files in directories, and is stripped
    /// from file names.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            files: IndexMap::new(),
            labels: IndexMap::new(),
        }
    }

    /// Creates a registry with every registration in `config`, in order.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, LoadError> {
        let mut registry = Self::new(config.suffix());
        for registration in config.registrations() {
            registry.register(
                registration.source(),
                registration.executable(),
                registration.labels(),
            )?;
        }
        debug!(
            "registered {} test {} with {} labels",
            registry.files.len(),
            plural::files_str(registry.files.len()),
            registry.labels.len(),
        );
        Ok(registry)
    }

    /// The suffix of test files.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Loads the files in `source`, run by `executable`, and adds each to `labels`.
    ///
    /// Returns the number of files loaded, including files that were already registered.
    pub fn register<I, S>(
        &mut self,
        source: &impl Loadable,
        executable: &Arc<Executable>,
        labels: I,
    ) -> Result<usize, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let files = source.load(executable, &self.suffix)?;
        let count = files.len();
        for file in files {
            self.add(file, &labels);
        }
        Ok(count)
    }

    /// Adds a single test file with `labels`.
    pub fn add(&mut self, file: TestFile, labels: &[String]) {
        let path = file.path().to_owned();
        let file = self.files.entry(path.clone()).or_insert(file);
        for name in labels {
            if file.add_label(name.as_str()) {
                self.labels
                    .entry(name.clone())
                    .or_default()
                    .add_path(path.clone());
            }
        }
    }

    /// Returns every file, in the order first registered.
    pub fn files(&self) -> impl ExactSizeIterator<Item = &TestFile> + '_ {
        self.files.values()
    }

    /// Returns the file at `path`, which must be canonical.
    pub fn file_by_path(&self, path: &Utf8Path) -> Option<&TestFile> {
        self.files.get(path)
    }

    /// Returns the files named `name`. Files in different directories can share a name.
    pub fn files_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TestFile> + 'a {
        self.files.values().filter(move |file| file.name() == name)
    }

    /// Returns the names of every label, in the order first used.
    pub fn label_names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.labels.keys().map(String::as_str)
    }

    /// Returns the label `name`.
    pub fn label(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    /// Returns a label containing every file.
    pub fn universe(&self) -> Label {
        self.files.keys().cloned().collect()
    }

    /// Returns the files selected by label tokens such as `unit`, `+slow` or `-network`.
    ///
    /// Tokens are applied left to right, starting from every file. With no tokens, every file is
    /// selected. Files are returned in the order of the resulting label.
    pub fn select<I, S>(&self, tokens: I) -> Result<Vec<&TestFile>, SelectError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let expression = LabelExpression::parse(tokens)?;
        self.select_expression(&expression)
    }

    /// Returns the files selected by a parsed expression.
    pub fn select_expression(
        &self,
        expression: &LabelExpression,
    ) -> Result<Vec<&TestFile>, SelectError> {
        let selected = expression.evaluate(&self.universe(), &self.labels)?;
        Ok(selected
            .paths()
            .filter_map(|path| self.files.get(path))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decoder::DecoderKind, list::FileSource};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn executable(name: &str) -> Arc<Executable> {
        Arc::new(Executable::new(name, "sh", DecoderKind::Text).unwrap())
    }

    fn registry() -> TestRegistry {
        let sh = executable("sh");
        let mut registry = TestRegistry::new(".t");
        for (path, labels) in [
            ("/t/a.t", &["unit"][..]),
            ("/t/b.t", &["unit", "slow"][..]),
            ("/t/c.t", &["slow"][..]),
        ] {
            let labels: Vec<String> = labels.iter().map(|label| label.to_string()).collect();
            registry.add(TestFile::with_name(path, &path[3..4], sh.clone()), &labels);
        }
        registry
    }

    fn names(files: Vec<&TestFile>) -> Vec<&str> {
        files.into_iter().map(TestFile::name).collect()
    }

    #[test_case(&[], &["a", "b", "c"] ; "everything")]
    #[test_case(&["unit"], &["a", "b"] ; "intersect")]
    #[test_case(&["unit", "-slow"], &["a"] ; "subtract")]
    #[test_case(&["unit", "-slow", "+slow"], &["a", "b", "c"] ; "union")]
    #[test_case(&["-unit", "+unit"], &["c", "a", "b"] ; "order follows the fold")]
    fn select(tokens: &[&str], expected: &[&str]) {
        let registry = registry();
        assert_eq!(names(registry.select(tokens).unwrap()), expected);
    }

    #[test]
    fn select_unknown_label() {
        let registry = registry();
        let err = registry.select(["unit", "-flaky"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown label `flaky` (known labels: slow, unit)"
        );
        assert!(matches!(
            registry.select([""]).unwrap_err(),
            SelectError::Parse(_)
        ));
    }

    #[test]
    fn duplicate_registrations_merge_labels() {
        let dir = camino_tempfile::tempdir().unwrap();
        let path = dir.path().join("math.t");
        std::fs::write(&path, "").unwrap();

        let first = executable("first");
        let second = executable("second");
        let mut registry = TestRegistry::new(".t");
        let source = FileSource::new(&path);
        assert_eq!(registry.register(&source, &first, ["unit"]).unwrap(), 1);
        assert_eq!(registry.register(&source, &second, ["fast", "unit"]).unwrap(), 1);

        assert_eq!(registry.files().len(), 1);
        let file = registry.files().next().unwrap();
        assert_eq!(file.executable().name(), "first");
        assert_eq!(file.name(), "math");
        assert_eq!(file.labels().collect::<Vec<_>>(), vec!["unit", "fast"]);
        assert_eq!(registry.label_names().collect::<Vec<_>>(), vec!["unit", "fast"]);
        assert_eq!(registry.label("unit").unwrap().len(), 1);
        assert!(registry.file_by_path(file.path()).is_some());
        assert_eq!(registry.files_by_name("math").count(), 1);
        assert_eq!(registry.files_by_name("nope").count(), 0);
    }
}
