// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Exit codes with a documented meaning for test-file processes.
///
/// The harness only distinguishes zero from non-zero; any non-zero exit is an abnormal
/// termination, and its stderr output is what gets reported.
pub enum TestFileExitCode {}

impl TestFileExitCode {
    /// The test file ran to completion.
    pub const OK: i32 = 0;

    /// The test file reported failed tests or errors and chose to signal that in its exit code.
    pub const TESTS_FAILED: i32 = 1;

    /// The process could not be started at all (missing interpreter, permission denied).
    ///
    /// The harness synthesizes this code itself, mirroring the shell convention for "command not
    /// found".
    pub const SPAWN_FAILED: i32 = 127;
}
