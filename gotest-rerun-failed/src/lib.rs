// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rerun the failed tests from `go test -json` output.
//!
//! Pipe `go test -json` into `gotest-rerun-failed`: it collects the failed tests, then reruns
//! them with one `go test -run` invocation per package, all at the same time. Extra arguments
//! are passed through to every `go test` invocation.
//!
//! ```text
//! go test -json ./... | gotest-rerun-failed -v -count=1
//! ```

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputContext;
