// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for `gotest-rerun-failed`.
//!
//! The basic flow of operations:
//!
//! 1. [`FailureCollector`](failure_set::FailureCollector) reads `go test -json` output and builds
//!    a [`FailureSet`](failure_set::FailureSet): the minimal set of failed tests per package.
//! 2. [`RerunPlan`](plan::RerunPlan) turns that into one invocation per package, each with a `-run`
//!    selector matching exactly the failed tests.
//! 3. [`RerunRunner`](runner::RerunRunner) launches all invocations concurrently and reports
//!    whether every one of them succeeded.

pub mod config;
pub mod errors;
pub mod event;
mod exit_codes;
pub mod failure_set;
pub mod plan;
pub mod runner;

pub use exit_codes::RerunExitCode;
