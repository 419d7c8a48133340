// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `testmark` failures.
///
/// `testmark` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TestmarkExitCode {}

impl TestmarkExitCode {
    /// No errors occurred and testmark exited normally.
    pub const OK: i32 = 0;

    /// The build tool ran, but no summary line or test results could be found in its output.
    ///
    /// This covers both "every test was skipped" and "the output could not be parsed"; the two
    /// are indistinguishable from console text alone.
    pub const NO_RESULTS: i32 = 4;

    /// One or more tests failed.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// The build tool could not be spawned.
    pub const BUILD_TOOL_EXEC_FAILED: i32 = 101;

    /// `testmark rerun` was invoked, but no previous command was recorded.
    pub const NO_PREVIOUS_COMMAND: i32 = 5;

    /// A user issue happened while setting up a testmark invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
