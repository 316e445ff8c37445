// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::TestFile;
use crate::{
    errors::LoadError,
    executable::Executable,
    helpers::{canonicalize, file_name_without_suffix},
};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use globset::GlobBuilder;
use std::{fmt, sync::Arc};
use tracing::trace;

/// Something that test files can be loaded from.
pub trait Loadable: fmt::Debug {
    /// Returns the paths of the test files in this source, in a stable order.
    ///
    /// `suffix` identifies test files, for sources that need to tell them apart from other files.
    fn paths(&self, suffix: &str) -> Result<Vec<Utf8PathBuf>, LoadError>;

    /// Loads test files, run by `executable`.
    ///
    /// Paths are canonicalized, and each file is named after its final path component with
    /// `suffix` removed.
    fn load(&self, executable: &Arc<Executable>, suffix: &str) -> Result<Vec<TestFile>, LoadError> {
        self.paths(suffix)?
            .iter()
            .map(|path| {
                let path = canonicalize(path)?;
                let name = file_name_without_suffix(&path, suffix).to_owned();
                Ok(TestFile::with_name(path, name, executable.clone()))
            })
            .collect()
    }
}

/// A single test file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileSource {
    path: Utf8PathBuf,
}

impl FileSource {
    /// Creates a new source for the file at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path of the file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Loadable for FileSource {
    fn paths(&self, _suffix: &str) -> Result<Vec<Utf8PathBuf>, LoadError> {
        if !self.path.is_file() {
            return Err(LoadError::NotFound {
                path: self.path.clone(),
            });
        }
        Ok(vec![self.path.clone()])
    }
}

/// Every file under a directory whose name ends with the test suffix, recursively.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirSource {
    root: Utf8PathBuf,
}

impl DirSource {
    /// Creates a new source for the directory at `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl Loadable for DirSource {
    fn paths(&self, suffix: &str) -> Result<Vec<Utf8PathBuf>, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::NotFound {
                path: self.root.clone(),
            });
        }

        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|err| LoadError::Walk {
                root: self.root.clone(),
                err,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = Utf8PathBuf::from_path_buf(entry.into_path())
                .map_err(|path| LoadError::NonUtf8Path { path })?;
            if path.file_name().is_some_and(|name| name.ends_with(suffix)) {
                paths.push(path);
            }
        }

        trace!(root = %self.root, count = paths.len(), "walked test directory");
        Ok(paths)
    }
}

/// Every file matching a glob pattern.
///
/// Only the directory named by the pattern's literal prefix (the components before the first one
/// containing a glob metacharacter) is walked. `*` doesn't match across `/`; use `**` for that.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GlobSource {
    pattern: String,
}

impl GlobSource {
    /// Creates a new source for `pattern`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// The glob pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn literal_prefix(&self) -> Utf8PathBuf {
        let mut prefix = Utf8PathBuf::new();
        for component in Utf8Path::new(&self.pattern).components() {
            if let Utf8Component::Normal(part) = component
                && part.contains(['*', '?', '[', '{'])
            {
                break;
            }
            prefix.push(component);
        }
        prefix
    }
}

impl Loadable for GlobSource {
    fn paths(&self, _suffix: &str) -> Result<Vec<Utf8PathBuf>, LoadError> {
        let matcher = GlobBuilder::new(&self.pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| LoadError::InvalidGlob {
                pattern: self.pattern.clone(),
                err,
            })?
            .compile_matcher();

        let prefix = self.literal_prefix();
        if !prefix.exists() {
            trace!(pattern = %self.pattern, %prefix, "glob prefix does not exist");
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(&prefix).sort_by_file_name() {
            let entry = entry.map_err(|err| LoadError::Walk {
                root: prefix.clone(),
                err,
            })?;
            if entry.file_type().is_file() && matcher.is_match(entry.path()) {
                let path = Utf8PathBuf::from_path_buf(entry.into_path())
                    .map_err(|path| LoadError::NonUtf8Path { path })?;
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

/// Any of the built-in sources.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TestSource {
    /// A single file.
    File(FileSource),

    /// A directory.
    Dir(DirSource),

    /// A glob pattern.
    Glob(GlobSource),
}

impl Loadable for TestSource {
    fn paths(&self, suffix: &str) -> Result<Vec<Utf8PathBuf>, LoadError> {
        match self {
            Self::File(source) => source.paths(suffix),
            Self::Dir(source) => source.paths(suffix),
            Self::Glob(source) => source.paths(suffix),
        }
    }
}
