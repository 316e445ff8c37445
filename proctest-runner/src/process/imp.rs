// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::executable::Executable;
use bytes::{Bytes, BytesMut};
use camino::Utf8Path;
use camino_tempfile::NamedUtf8TempFile;
use proctest_metadata::TestFileExitCode;
use std::{
    fmt,
    fs::File,
    io::{self, Read},
    mem,
    process::{Child, Command, ExitStatus, Stdio},
};
use tracing::{debug, warn};

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        #[path = "unix.rs"]
        mod unix;
        use unix as os;
    } else if #[cfg(windows)] {
        #[path = "windows.rs"]
        mod windows;
        use windows as os;
    } else {
        compile_error!("unsupported target platform");
    }
}

/// The size of each read from a child's output.
///
/// This size is not totally arbitrary, but rather the (normal) page size on most systems.
const CHUNK_SIZE: usize = 4 * 1024;

/// How a test file's process ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessExit {
    /// The process exited with this code.
    Code(i32),

    /// The process was terminated by this signal.
    Signal(i32),

    /// The process ended, but its status could not be determined.
    Unknown,
}

impl ProcessExit {
    /// Returns true if the process exited with code 0.
    pub fn is_success(self) -> bool {
        self == Self::Code(TestFileExitCode::OK)
    }

    /// Returns the exit code, if the process exited normally.
    pub fn code(self) -> Option<i32> {
        match self {
            Self::Code(code) => Some(code),
            Self::Signal(_) | Self::Unknown => None,
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Self::Code(code),
            None => os::signal(status).map_or(Self::Unknown, Self::Signal),
        }
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signal(signal) => write!(f, "signal {signal}"),
            Self::Unknown => write!(f, "unknown status"),
        }
    }
}

/// One OS process running a test file.
///
/// Stdout and stderr are drained without blocking: [`poll_output`](Self::poll_output) and
/// [`poll_errors`](Self::poll_errors) return whatever became available since the last call. Stderr
/// is always captured through a temporary file. The process is closed once it has exited and
/// both streams are drained.
///
/// A process that can't be started is reported like a process that failed straight away: it
/// exits with [`TestFileExitCode::SPAWN_FAILED`] and the reason is its stderr.
///
/// Dropping a `ChildProcess` whose OS process is still running kills it.
#[derive(Debug)]
pub struct ChildProcess {
    command: Vec<String>,
    state: ProcessState,
    pending_output: BytesMut,
    pending_errors: BytesMut,
    exit: Option<ProcessExit>,
}

#[derive(Debug)]
enum ProcessState {
    NotStarted,
    Running {
        child: Child,
        stdout: Option<os::StdoutReader>,
        stderr: Option<CaptureFile>,
    },
    Closed,
}

impl ChildProcess {
    /// Prepares a process that runs `path` with `executable`. Nothing is started until
    /// [`execute`](Self::execute) is called.
    pub fn new(executable: &Executable, path: &Utf8Path) -> Self {
        Self::from_command(executable.command_for(path))
    }

    /// Prepares a process for a command line whose first element is the program.
    pub fn from_command(command: Vec<String>) -> Self {
        Self {
            command,
            state: ProcessState::NotStarted,
            pending_output: BytesMut::new(),
            pending_errors: BytesMut::new(),
            exit: None,
        }
    }

    /// Returns the command line.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Starts the process and returns immediately.
    ///
    /// Calling this more than once has no effect.
    pub fn execute(&mut self) {
        if !matches!(self.state, ProcessState::NotStarted) {
            debug!(command = ?self.command, "process already started");
            return;
        }

        match self.spawn() {
            Ok(state) => {
                self.state = state;
            }
            Err(err) => {
                debug!(command = ?self.command, %err, "failed to spawn test file");
                let message = format!(
                    "failed to execute `{}`: {err}\n",
                    shell_words::join(&self.command)
                );
                self.pending_errors.extend_from_slice(message.as_bytes());
                self.exit = Some(ProcessExit::Code(TestFileExitCode::SPAWN_FAILED));
                self.state = ProcessState::Closed;
            }
        }
    }

    fn spawn(&self) -> io::Result<ProcessState> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "command is empty"))?;

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());

        let stdout = os::StdoutSetup::configure(&mut cmd)?;
        let stderr = CaptureFile::new("stderr")?;
        cmd.stderr(stderr.stdio()?);

        let mut child = cmd.spawn()?;
        debug!(command = ?self.command, pid = child.id(), "spawned test file");

        let stdout = match stdout.attach(&mut child) {
            Ok(stdout) => stdout,
            Err(err) => {
                kill_and_reap(&mut child);
                return Err(err);
            }
        };

        Ok(ProcessState::Running {
            child,
            stdout: Some(stdout),
            stderr: Some(stderr),
        })
    }

    /// Returns the OS process ID while the process is running.
    pub fn id(&self) -> Option<u32> {
        match &self.state {
            ProcessState::Running { child, .. } if self.exit.is_none() => Some(child.id()),
            _ => None,
        }
    }

    /// Returns stdout bytes that became available since the last call, possibly none.
    pub fn poll_output(&mut self) -> Bytes {
        let mut buf = mem::take(&mut self.pending_output);
        if let ProcessState::Running { stdout, .. } = &mut self.state {
            read_into(stdout, &mut buf, "stdout", false);
        }
        buf.freeze()
    }

    /// Returns stderr bytes that became available since the last call, possibly none.
    pub fn poll_errors(&mut self) -> Bytes {
        let mut buf = mem::take(&mut self.pending_errors);
        if let ProcessState::Running { stderr, .. } = &mut self.state {
            read_into(stderr, &mut buf, "stderr", false);
        }
        buf.freeze()
    }

    /// Returns true once the process has exited and all of its output has been returned.
    ///
    /// Output that arrives between the last poll and the exit is buffered here, and handed out by
    /// the next [`poll_output`](Self::poll_output) or [`poll_errors`](Self::poll_errors) call.
    pub fn is_closed(&mut self) -> bool {
        let ProcessState::Running {
            child,
            stdout,
            stderr,
        } = &mut self.state
        else {
            return matches!(self.state, ProcessState::Closed)
                && self.pending_output.is_empty()
                && self.pending_errors.is_empty();
        };

        if self.exit.is_none() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let exit = ProcessExit::from_status(status);
                    debug!(command = ?self.command, %exit, "test file exited");
                    self.exit = Some(exit);
                }
                Ok(None) => return false,
                Err(err) => {
                    warn!(command = ?self.command, %err, "failed to query test file status");
                    kill_and_reap(child);
                    self.exit = Some(ProcessExit::Unknown);
                }
            }
        }

        if !self.pending_output.is_empty() || !self.pending_errors.is_empty() {
            return false;
        }

        let stdout_read = read_into(stdout, &mut self.pending_output, "stdout", true);
        let stderr_read = read_into(stderr, &mut self.pending_errors, "stderr", true);
        if stdout_read > 0 || stderr_read > 0 || stdout.is_some() || stderr.is_some() {
            return false;
        }

        // Both streams are drained, and the capture files were removed when they were dropped.
        self.state = ProcessState::Closed;
        true
    }

    /// Returns how the process ended, once it has.
    pub fn exit(&self) -> Option<ProcessExit> {
        self.exit
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        if let ProcessState::Running { child, .. } = &mut self.state {
            if self.exit.is_none() {
                debug!(command = ?self.command, "killing test file that is still running");
                kill_and_reap(child);
            }
        }
    }
}

fn kill_and_reap(child: &mut Child) {
    // The process may have exited on its own in the meantime, so errors are expected.
    _ = child.kill();
    _ = child.wait();
}

/// A source of output that can be read without blocking.
pub(super) trait OutputSource {
    /// Reads everything that is currently available into `buf`.
    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize>;

    /// Returns true if the last read reached the end of the stream.
    ///
    /// Only meaningful once the process has exited.
    fn at_end(&self) -> bool;
}

/// Reads what's available from `source`.
///
/// The source is dropped if it breaks, or if it is exhausted after the process has `exited`.
fn read_into<S: OutputSource>(
    source: &mut Option<S>,
    buf: &mut BytesMut,
    name: &str,
    exited: bool,
) -> usize {
    let Some(reader) = source else {
        return 0;
    };
    match reader.read_available(buf) {
        Ok(0) if exited && reader.at_end() => {
            *source = None;
            0
        }
        Ok(n) => n,
        Err(err) => {
            warn!(stream = name, %err, "error reading test file output");
            *source = None;
            0
        }
    }
}

/// A temporary file that a child writes to, read back incrementally through a second handle.
#[derive(Debug)]
pub(super) struct CaptureFile {
    file: NamedUtf8TempFile,
    reader: File,
    // A read that returns nothing means the end only once the writer is gone.
    at_end: bool,
}

impl CaptureFile {
    pub(super) fn new(stream: &str) -> io::Result<Self> {
        let file = camino_tempfile::Builder::new()
            .prefix("proctest-")
            .suffix(&format!(".{stream}"))
            .tempfile()?;
        let reader = file.reopen()?;
        Ok(Self {
            file,
            reader,
            at_end: false,
        })
    }

    pub(super) fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.file.as_file().try_clone()?))
    }
}

impl OutputSource for CaptureFile {
    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        let mut chunk = [0u8; CHUNK_SIZE];
        let mut total = 0;
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.at_end = total == 0;
                    return Ok(total);
                }
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn at_end(&self) -> bool {
        self.at_end
    }
}
