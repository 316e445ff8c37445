// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::LoadError;
use camino::{Utf8Path, Utf8PathBuf};

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "file" if `count` is 1, otherwise "files".
    pub fn files_str(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }

    /// Returns "process" if `count` is 1, otherwise "processes".
    pub fn processes_str(count: usize) -> &'static str {
        if count == 1 { "process" } else { "processes" }
    }
}

/// Canonicalizes a path, stripping the `\\?\` prefix on Windows.
pub(crate) fn canonicalize(path: &Utf8Path) -> Result<Utf8PathBuf, LoadError> {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            let canonical = dunce::canonicalize(path);
        } else {
            let canonical = std::fs::canonicalize(path);
        }
    }
    let canonical = canonical.map_err(|err| LoadError::Canonicalize {
        path: path.to_owned(),
        err,
    })?;
    Utf8PathBuf::from_path_buf(canonical).map_err(|path| LoadError::NonUtf8Path { path })
}

/// Returns the final component of `path` with `suffix` stripped from the end.
pub(crate) fn file_name_without_suffix<'a>(path: &'a Utf8Path, suffix: &str) -> &'a str {
    let file_name = path.file_name().unwrap_or(path.as_str());
    match file_name.strip_suffix(suffix) {
        Some(name) if !name.is_empty() => name,
        _ => file_name,
    }
}
