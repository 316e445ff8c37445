// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::CaptureFile;
use std::{
    io,
    process::{Child, Command, ExitStatus},
};

pub(super) fn signal(_status: ExitStatus) -> Option<i32> {
    None
}

/// Anonymous pipes can't be read without blocking here, so stdout goes through a file as well.
pub(super) struct StdoutSetup {
    capture: CaptureFile,
}

impl StdoutSetup {
    pub(super) fn configure(cmd: &mut Command) -> io::Result<Self> {
        let capture = CaptureFile::new("stdout")?;
        cmd.stdout(capture.stdio()?);
        Ok(Self { capture })
    }

    pub(super) fn attach(self, _child: &mut Child) -> io::Result<StdoutReader> {
        Ok(self.capture)
    }
}

pub(super) type StdoutReader = CaptureFile;
