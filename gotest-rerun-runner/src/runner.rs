// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rerun runner.
//!
//! The main structure in this module is [`RerunRunner`], which executes every invocation of a
//! [`RerunPlan`] at the same time and waits for all of them to finish.

use crate::{
    config::RerunCommand,
    errors::RunnerBuildError,
    plan::{RerunPlan, RerunSpec},
};
use std::{fmt, io, process::Stdio};
use tokio::{
    process::{Child, Command},
    runtime::Runtime,
    sync::mpsc::{self, UnboundedSender},
};
use tracing::debug;

/// Runs rerun invocations concurrently, one process per package.
///
/// There is no limit on the number of processes running at the same time, and no invocation is
/// ever canceled: a failure only affects the final status.
#[derive(Debug)]
pub struct RerunRunner {
    command: RerunCommand,
    runtime: Runtime,
}

impl RerunRunner {
    /// Creates a new runner.
    pub fn new(command: RerunCommand) -> Result<Self, RunnerBuildError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("gotest-rerun-worker")
            .build()
            .map_err(RunnerBuildError::TokioRuntimeCreate)?;
        Ok(Self { command, runtime })
    }

    /// Executes all invocations in the plan and waits for them to finish.
    ///
    /// The callback is called with a [`RunEvent::Started`] event right before each process is
    /// launched, in plan order, and with a [`RunEvent::Finished`] event as each one completes.
    ///
    /// Child processes inherit stdout and stderr, so their output is interleaved live.
    pub fn execute<F>(&self, plan: &RerunPlan, mut callback: F) -> RunSummary
    where
        F: FnMut(RunEvent<'_>),
    {
        self.runtime.block_on(self.execute_inner(plan, &mut callback))
    }

    async fn execute_inner<F>(&self, plan: &RerunPlan, callback: &mut F) -> RunSummary
    where
        F: FnMut(RunEvent<'_>),
    {
        let (sender, mut receiver) = mpsc::unbounded_channel();

        for spec in plan.specs() {
            callback(RunEvent::Started {
                spec,
                command_line: spec.display_command(&self.command),
            });

            match self.spawn(spec) {
                Ok(child) => {
                    debug!("launched rerun for {}", spec.package_name());
                    tokio::spawn(wait_for_child(child, spec.clone(), sender.clone()));
                }
                Err(error) => {
                    // Failure to send means the receiver was dropped.
                    let _ = sender.send(RunOutcome {
                        spec: spec.clone(),
                        result: RunResult::ExecFailed { error },
                    });
                }
            }
        }

        // Every worker holds a clone of the sender. Once the last one finishes, the channel closes
        // and the loop below completes.
        drop(sender);

        let mut outcomes = Vec::with_capacity(plan.len());
        while let Some(outcome) = receiver.recv().await {
            callback(RunEvent::Finished { outcome: &outcome });
            outcomes.push(outcome);
        }

        RunSummary::new(plan.len(), outcomes)
    }

    fn spawn(&self, spec: &RerunSpec) -> io::Result<Child> {
        Command::new(self.command.program())
            .args(spec.command_args(&self.command))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
    }
}

async fn wait_for_child(mut child: Child, spec: RerunSpec, sender: UnboundedSender<RunOutcome>) {
    let result = match child.wait().await {
        Ok(status) if status.success() => RunResult::Passed,
        Ok(status) => RunResult::Failed {
            exit_code: status.code(),
        },
        Err(error) => RunResult::ExecFailed { error },
    };
    // Failure to send means the receiver was dropped.
    let _ = sender.send(RunOutcome { spec, result });
}

/// An event emitted while executing a [`RerunPlan`].
#[derive(Debug)]
pub enum RunEvent<'a> {
    /// An invocation is about to be launched.
    Started {
        /// The invocation.
        spec: &'a RerunSpec,

        /// The full command line, quoted for a shell.
        command_line: String,
    },

    /// An invocation finished, or could not be launched.
    Finished {
        /// The outcome of the invocation.
        outcome: &'a RunOutcome,
    },
}

/// The result of a single invocation.
#[derive(Debug)]
pub enum RunResult {
    /// The process exited successfully.
    Passed,

    /// The process exited with a failure.
    Failed {
        /// The exit code, or `None` if the process was terminated by a signal.
        exit_code: Option<i32>,
    },

    /// The process could not be launched or waited for.
    ExecFailed {
        /// The underlying error.
        error: io::Error,
    },
}

impl RunResult {
    /// Returns true if the invocation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed {
                exit_code: Some(code),
            } => write!(f, "failed with exit code {code}"),
            Self::Failed { exit_code: None } => write!(f, "terminated by a signal"),
            Self::ExecFailed { error } => write!(f, "failed to execute: {error}"),
        }
    }
}

/// The outcome of one invocation.
#[derive(Debug)]
pub struct RunOutcome {
    /// The invocation.
    pub spec: RerunSpec,

    /// What happened.
    pub result: RunResult,
}

impl RunOutcome {
    /// Returns true if the invocation succeeded.
    pub fn succeeded(&self) -> bool {
        self.result.is_success()
    }
}

/// The outcomes of all invocations of a plan, sorted by package.
#[derive(Debug)]
pub struct RunSummary {
    planned: usize,
    outcomes: Vec<RunOutcome>,
}

impl RunSummary {
    fn new(planned: usize, mut outcomes: Vec<RunOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.spec.package_name().cmp(b.spec.package_name()));
        Self { planned, outcomes }
    }

    /// Returns the number of invocations that were planned.
    pub fn planned(&self) -> usize {
        self.planned
    }

    /// Returns the outcomes, sorted by package.
    pub fn outcomes(&self) -> &[RunOutcome] {
        &self.outcomes
    }

    /// Returns the outcomes of invocations that didn't succeed.
    pub fn failed(&self) -> impl Iterator<Item = &RunOutcome> + '_ {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded())
    }

    /// Returns the number of invocations that never reported an outcome.
    ///
    /// This is non-zero only if a worker task panicked.
    pub fn missing(&self) -> usize {
        self.planned.saturating_sub(self.outcomes.len())
    }

    /// Returns true if every planned invocation succeeded. A run with no invocations is a success.
    pub fn is_success(&self) -> bool {
        self.missing() == 0 && self.outcomes.iter().all(RunOutcome::succeeded)
    }
}
