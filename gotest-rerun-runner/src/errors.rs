// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the rerun engine.

use std::io;
use thiserror::Error;

/// A line of the event stream could not be decoded into a test event.
///
/// This error is recoverable: the line is skipped and reading continues.
#[derive(Debug, Error)]
#[error("invalid JSON on line {line_number}")]
pub struct EventParseError {
    line_number: usize,
    #[source]
    error: serde_json::Error,
}

impl EventParseError {
    pub(crate) fn new(line_number: usize, error: serde_json::Error) -> Self {
        Self { line_number, error }
    }

    /// Returns the 1-based line number of the invalid line.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Returns the underlying decode error.
    pub fn error(&self) -> &serde_json::Error {
        &self.error
    }
}

/// Reading the event stream failed.
///
/// Unlike [`EventParseError`], this is fatal: no reruns are attempted.
#[derive(Debug, Error)]
#[error("error reading input at line {line_number}")]
pub struct ReadEventsError {
    line_number: usize,
    #[source]
    error: io::Error,
}

impl ReadEventsError {
    pub(crate) fn new(line_number: usize, error: io::Error) -> Self {
        Self { line_number, error }
    }

    /// Returns the 1-based number of the line that was being read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Returns the underlying I/O error.
    pub fn error(&self) -> &io::Error {
        &self.error
    }
}

/// An error that occurred while reading configuration from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An environment variable contained non-UTF-8 data.
    #[error("environment variable `{0}` contained non-UTF-8 data")]
    InvalidEnvironmentVar(String),

    /// The command specified by an environment variable could not be split into words.
    #[error("environment variable `{key}` = `{value}` is not a valid command line")]
    CommandSplit {
        /// The environment variable.
        key: String,

        /// The value that was read.
        value: String,

        /// The error that occurred while splitting.
        #[source]
        error: shell_words::ParseError,
    },

    /// The command specified by an environment variable didn't contain a program.
    #[error("environment variable `{key}` = `{value}` did not contain a program")]
    ProgramNotSpecified {
        /// The environment variable.
        key: String,

        /// The value that was read.
        value: String,
    },
}

/// An error that occurred while building the rerun runner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerBuildError {
    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime")]
    TokioRuntimeCreate(#[source] io::Error),
}
