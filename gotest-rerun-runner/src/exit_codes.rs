// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `gotest-rerun-failed`.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum RerunExitCode {}

impl RerunExitCode {
    /// No failed tests were found, or every rerun succeeded.
    pub const OK: i32 = 0;

    /// Reading input failed, or at least one rerun did not succeed.
    pub const FAILED: i32 = 1;

    /// No input was piped in. Usage was printed.
    pub const USAGE: i32 = 2;
}
