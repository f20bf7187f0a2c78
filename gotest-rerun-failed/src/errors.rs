// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING, StderrStyles};
use gotest_rerun_runner::{
    RerunExitCode,
    errors::{ConfigError, ReadEventsError, RunnerBuildError},
    runner::RunSummary,
};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error: one caused by the input or the environment, not by a bug.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("configuration error")]
    ConfigError {
        #[from]
        err: ConfigError,
    },
    #[error("error reading input")]
    ReadEventsError {
        #[from]
        err: ReadEventsError,
    },
    #[error("building rerun runner failed")]
    RunnerBuildError {
        #[from]
        err: RunnerBuildError,
    },
    #[error("rerun failed")]
    RerunFailed {
        failed_packages: Vec<String>,
        missing: usize,
        planned: usize,
    },
}

impl ExpectedError {
    pub(crate) fn rerun_failed(summary: &RunSummary) -> Self {
        Self::RerunFailed {
            failed_packages: summary
                .failed()
                .map(|outcome| outcome.spec.package_name().to_owned())
                .collect(),
            missing: summary.missing(),
            planned: summary.planned(),
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigError { .. }
            | Self::ReadEventsError { .. }
            | Self::RunnerBuildError { .. }
            | Self::RerunFailed { .. } => RerunExitCode::FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::ReadEventsError { err } => {
                tracing::error!(
                    "error reading input at line {}",
                    err.line_number().style(styles.bold)
                );
                Some(err.error() as &dyn Error)
            }
            Self::RunnerBuildError { err } => {
                tracing::error!("failed to build rerun runner");
                Some(err as &dyn Error)
            }
            Self::RerunFailed {
                failed_packages,
                missing,
                planned,
            } => {
                let failed_count = failed_packages.len() + missing;
                let packages_str = failed_packages
                    .iter()
                    .map(|package| package.style(styles.bold).to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::error!(
                    "rerun failed for {failed_count} of {planned} {}: {packages_str}",
                    plural_packages(*planned),
                );
                if *missing > 0 {
                    tracing::error!(
                        target: NO_HEADING,
                        "({missing} {} did not report a result)",
                        if *missing == 1 { "invocation" } else { "invocations" },
                    );
                }
                None
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

fn plural_packages(count: usize) -> &'static str {
    if count == 1 { "package" } else { "packages" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let error = ExpectedError::RerunFailed {
            failed_packages: vec!["pkgY".to_owned()],
            missing: 0,
            planned: 2,
        };
        assert_eq!(error.process_exit_code(), RerunExitCode::FAILED);
    }
}
