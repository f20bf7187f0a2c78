// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for reruns.
//!
//! All command-line arguments are passed through to `go test`, so configuration is read from the
//! environment instead.

use crate::errors::ConfigError;

/// The command used to rerun tests, before the per-package arguments are added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RerunCommand {
    program: String,
    leading_args: Vec<String>,
}

impl RerunCommand {
    /// The environment variable used to override the `go` program.
    ///
    /// The value is split into words with shell quoting rules. The first word is the program, and
    /// the remaining words are inserted before `test`.
    pub const GO_ENV: &'static str = "GOTEST_RERUN_GO";

    /// The default program.
    pub const DEFAULT_PROGRAM: &'static str = "go";

    /// The `go` subcommand used for reruns.
    pub const TEST_SUBCOMMAND: &'static str = "test";

    /// Creates a new command out of a program and the arguments that come before the package.
    pub fn new(
        program: impl Into<String>,
        leading_args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    /// Determines the command from the environment, falling back to `go test`.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(Self::GO_ENV) {
            Some(value) => {
                let value = value
                    .into_string()
                    .map_err(|_osstr| ConfigError::InvalidEnvironmentVar(Self::GO_ENV.to_owned()))?;
                Self::parse(Self::GO_ENV, value)
            }
            None => Ok(Self::default()),
        }
    }

    fn parse(key: &str, value: String) -> Result<Self, ConfigError> {
        let words = shell_words::split(&value).map_err(|error| ConfigError::CommandSplit {
            key: key.to_owned(),
            value: value.clone(),
            error,
        })?;

        let mut words = words.into_iter();
        let program = words.next().ok_or_else(|| ConfigError::ProgramNotSpecified {
            key: key.to_owned(),
            value: value.clone(),
        })?;

        Ok(Self::new(
            program,
            words.chain(std::iter::once(Self::TEST_SUBCOMMAND.to_owned())),
        ))
    }

    /// Returns the program to execute.
    ///
    /// This is a `str` rather than a path: it's most commonly a program name looked up in `PATH`.
    #[inline]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments that precede the package name.
    #[inline]
    pub fn leading_args(&self) -> impl Iterator<Item = &str> {
        self.leading_args.iter().map(AsRef::as_ref)
    }
}

impl Default for RerunCommand {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM, [Self::TEST_SUBCOMMAND])
    }
}
