// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    output::{NO_HEADING, OutputContext, StderrStyles},
};
use clap::{CommandFactory, Parser};
use gotest_rerun_runner::{
    RerunExitCode,
    config::RerunCommand,
    failure_set::FailureCollector,
    plan::RerunPlan,
    runner::{RerunRunner, RunEvent},
};
use owo_colors::OwoColorize;
use std::{
    ffi::OsString,
    io::{self, BufRead, IsTerminal},
};

const ENV_HELP: &str = "\
Environment variables:
  GOTEST_RERUN_GO     Program used for reruns, with optional leading arguments [default: go]
  GOTEST_RERUN_COLOR  Produce color output: auto, always, never [default: auto]
  GOTEST_RERUN_LOG    Log filter, for example `debug` [default: info]";

/// Rerun the failed tests from `go test -json` output.
///
/// Reads JSON output from `go test -json` on stdin, identifies failed tests, and reruns them with
/// one `go test` invocation per package, all running at the same time. Additional arguments are
/// passed to `go test` when rerunning failed tests.
///
/// The clap definition only renders help: arguments are never parsed, since clap would drop a
/// leading `--`. Use [`Self::from_args`] instead.
#[derive(Debug, Parser)]
#[command(
    name = "gotest-rerun-failed",
    override_usage = "go test -json ./... | gotest-rerun-failed [GO_TEST_ARGS]...",
    disable_help_flag = true,
    disable_version_flag = true,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
    after_long_help = ENV_HELP,
)]
pub struct RerunFailedApp {
    /// Arguments passed to `go test` when rerunning failed tests
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "GO_TEST_ARGS"
    )]
    go_test_args: Vec<OsString>,
}

impl RerunFailedApp {
    /// Creates the app out of the process arguments, excluding the program name.
    ///
    /// Every argument is kept verbatim, including `--` and arguments that aren't valid UTF-8.
    pub fn from_args(args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        Self {
            go_test_args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        let styles = output.stderr_styles();

        if self.help_requested() {
            print_usage(&styles);
            return Ok(RerunExitCode::OK);
        }

        let stdin = io::stdin();
        if stdin.is_terminal() {
            print_usage(&styles);
            return Ok(RerunExitCode::USAGE);
        }

        let command = RerunCommand::from_env()?;
        rerun_failed(command, &self.go_test_args, stdin.lock(), &styles)
    }

    /// Returns true if the first argument asks for help. Help flags anywhere else are passed
    /// through.
    fn help_requested(&self) -> bool {
        matches!(
            self.go_test_args.first().and_then(|arg| arg.to_str()),
            Some("-h" | "--help")
        )
    }
}

fn print_usage(styles: &StderrStyles) {
    let help = RerunFailedApp::command().render_long_help();
    if styles.colorize_help {
        eprintln!("{}", help.ansi());
    } else {
        eprintln!("{help}");
    }
}

/// Reads `go test -json` output from `input`, then reruns every failed test.
pub(crate) fn rerun_failed(
    command: RerunCommand,
    extra_args: &[OsString],
    input: impl BufRead,
    styles: &StderrStyles,
) -> Result<i32> {
    let failures = FailureCollector::new().read_all(input)?;
    if failures.is_empty() {
        tracing::info!("no failed tests found");
        return Ok(RerunExitCode::OK);
    }

    let plan = RerunPlan::new(failures, extra_args);
    let runner = RerunRunner::new(command)?;

    tracing::info!(target: NO_HEADING, "Rerunning failed tests:");
    let summary = runner.execute(&plan, |event| match event {
        RunEvent::Started { command_line, .. } => {
            tracing::info!(target: NO_HEADING, "{command_line}");
        }
        RunEvent::Finished { outcome } => {
            let package = outcome.spec.package_name();
            if outcome.succeeded() {
                tracing::debug!("rerun for {package} passed");
            } else {
                tracing::error!("rerun for {} {}", package.style(styles.bold), outcome.result);
            }
        }
    });

    if summary.is_success() {
        tracing::debug!("all {} reruns passed", summary.planned());
        Ok(RerunExitCode::OK)
    } else {
        Err(ExpectedError::rerun_failed(&summary))
    }
}
