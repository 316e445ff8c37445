// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::Result;
use proctest_runner::{
    decoder::DecoderKind,
    executable::Executable,
    list::TestFile,
    reporter::{OutputSink, SinkCall},
};
use std::{
    sync::{Arc, Once},
    thread,
    time::{Duration, Instant},
};

pub(crate) const EMIT_FRAMES: &str = env!("CARGO_BIN_EXE_emit-frames");

pub(crate) fn test_init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        color_eyre::install().ok();
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init()
            .ok();
    });
}

/// The executable that runs scripts with `emit-frames`.
pub(crate) fn emit_frames() -> Arc<Executable> {
    Arc::new(
        Executable::from_args("emit-frames", [EMIT_FRAMES], DecoderKind::Compact)
            .expect("command is not empty"),
    )
}

/// A temporary directory of test scripts.
pub(crate) struct ScriptDir {
    dir: Utf8TempDir,
    executable: Arc<Executable>,
}

impl ScriptDir {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            dir: camino_tempfile::Builder::new()
                .prefix("proctest-integration-")
                .tempdir()?,
            executable: emit_frames(),
        })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        self.dir.path()
    }

    /// A path inside the directory for marker files.
    pub(crate) fn marker(&self, name: &str) -> Utf8PathBuf {
        self.dir.path().join(format!("{name}.marker"))
    }

    /// Writes a script and returns a test file that runs it.
    pub(crate) fn script(&self, relative: &str, contents: &str) -> Result<TestFile> {
        let path = self.write(relative, contents)?;
        Ok(TestFile::new(path, self.executable.clone()))
    }

    /// Writes a file without creating a test file for it.
    pub(crate) fn write(&self, relative: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Returns the paths of the focus calls, collapsing repeats of the same path.
pub(crate) fn focus_sequence(calls: &[SinkCall]) -> Vec<&Utf8Path> {
    let mut sequence: Vec<&Utf8Path> = Vec::new();
    for call in calls {
        if let SinkCall::Focus(path) = call
            && sequence.last() != Some(&path.as_path())
        {
            sequence.push(path);
        }
    }
    sequence
}

/// Returns the index of the first call matching `f`.
pub(crate) fn position(calls: &[SinkCall], f: impl Fn(&SinkCall) -> bool) -> usize {
    calls
        .iter()
        .position(f)
        .unwrap_or_else(|| panic!("no matching call in {calls:#?}"))
}

/// Repeatedly calls `f` until it returns true, failing after 30 seconds.
pub(crate) fn wait_until(mut f: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while !f() {
        assert!(Instant::now() < deadline, "timed out");
        thread::sleep(Duration::from_millis(1));
    }
}

/// A sink that checks the focus/close bracketing while forwarding to another sink.
///
/// Every event must be preceded by a focus, and a closed file must be refocused before it gets
/// any more events.
pub(crate) struct BracketChecker<S> {
    inner: S,
    focused: Option<Utf8PathBuf>,
    closed: Vec<Utf8PathBuf>,
}

impl<S: OutputSink> BracketChecker<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            focused: None,
            closed: Vec::new(),
        }
    }

    pub(crate) fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: OutputSink> OutputSink for BracketChecker<S> {
    fn focus(&mut self, path: &Utf8Path) {
        assert!(
            !self.closed.iter().any(|closed| closed == path),
            "{path} focused after it was closed"
        );
        self.focused = Some(path.to_owned());
        self.inner.focus(path);
    }

    fn event(&mut self, event: proctest_metadata::Event) {
        assert!(self.focused.is_some(), "event {event:?} without focus");
        self.inner.event(event);
    }

    fn close(&mut self) {
        let path = self.focused.take().expect("close without focus");
        self.closed.push(path);
        self.inner.close();
    }

    fn flush(&mut self) {
        assert!(self.focused.is_none(), "flush with a file still focused");
        self.inner.flush();
    }
}
