// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{CHUNK_SIZE, OutputSource};
use bytes::BytesMut;
use std::{
    io::{self, Read},
    os::{fd::AsRawFd, unix::process::ExitStatusExt},
    process::{Child, ChildStdout, Command, ExitStatus, Stdio},
};

pub(super) fn signal(status: ExitStatus) -> Option<i32> {
    status.signal()
}

/// Stdout is a pipe, switched to non-blocking mode once the child is spawned.
pub(super) struct StdoutSetup;

impl StdoutSetup {
    pub(super) fn configure(cmd: &mut Command) -> io::Result<Self> {
        cmd.stdout(Stdio::piped());
        Ok(Self)
    }

    pub(super) fn attach(self, child: &mut Child) -> io::Result<StdoutReader> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
        set_nonblocking(&stdout)?;
        Ok(StdoutReader {
            stdout,
            at_end: false,
        })
    }
}

fn set_nonblocking(stdout: &ChildStdout) -> io::Result<()> {
    let fd = stdout.as_raw_fd();
    // SAFETY: fd is a valid descriptor owned by `stdout` for the duration of these calls.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[derive(Debug)]
pub(super) struct StdoutReader {
    stdout: ChildStdout,
    at_end: bool,
}

impl OutputSource for StdoutReader {
    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        let mut chunk = [0u8; CHUNK_SIZE];
        let mut total = 0;
        loop {
            match self.stdout.read(&mut chunk) {
                Ok(0) => {
                    self.at_end = true;
                    return Ok(total);
                }
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(total),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn at_end(&self) -> bool {
        self.at_end
    }
}
