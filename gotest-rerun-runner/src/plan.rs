// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Planning of rerun invocations.
//!
//! A [`RerunPlan`] turns a [`FailureSet`] into one [`RerunSpec`] per package. Each spec selects
//! exactly the failed tests of its package through `go test -run`.

use crate::{config::RerunCommand, failure_set::FailureSet};
use std::ffi::{OsStr, OsString};
use swrite::{SWrite, swrite};

/// The flag used to pass the test selector to `go test`.
pub const RUN_FLAG: &str = "-run";

/// Escapes every character that has a special meaning in a Go regular expression.
///
/// The escaped characters are the ones Go's `regexp.QuoteMeta` escapes: `\.+*?()|[]{}^$`. The
/// output has the same meaning in Rust's `regex` syntax.
pub fn quote_meta(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted
}

/// Builds a selector that matches exactly the given test names, each one anchored on both ends.
///
/// Test names are sorted first, so the result doesn't depend on iteration order.
///
/// ```
/// use gotest_rerun_runner::plan::test_selector;
///
/// assert_eq!(test_selector(["TestB/Sub1", "TestA"]), "^TestA$|^TestB/Sub1$");
/// ```
pub fn test_selector<'a>(test_names: impl IntoIterator<Item = &'a str>) -> String {
    let mut test_names: Vec<_> = test_names.into_iter().collect();
    test_names.sort_unstable();
    test_names.dedup();

    let mut selector = String::new();
    for (idx, test_name) in test_names.into_iter().enumerate() {
        if idx > 0 {
            selector.push('|');
        }
        swrite!(selector, "^{}$", quote_meta(test_name));
    }
    selector
}

/// A single rerun invocation: the failed tests of one package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RerunSpec {
    package_name: String,
    test_selector: String,
    extra_args: Vec<OsString>,
}

impl RerunSpec {
    /// Creates a new spec.
    pub fn new(
        package_name: impl Into<String>,
        test_selector: impl Into<String>,
        extra_args: Vec<OsString>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            test_selector: test_selector.into(),
            extra_args,
        }
    }

    /// Returns the package to rerun tests in.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Returns the `-run` expression selecting the failed tests.
    pub fn test_selector(&self) -> &str {
        &self.test_selector
    }

    /// Returns the arguments passed through verbatim after the selector.
    pub fn extra_args(&self) -> &[OsString] {
        &self.extra_args
    }

    /// Returns the arguments to pass to the program of `command`: the command's leading
    /// arguments, the package, `-run <selector>`, then the extra arguments.
    pub fn command_args<'a>(&'a self, command: &'a RerunCommand) -> Vec<&'a OsStr> {
        command
            .leading_args()
            .chain([
                self.package_name.as_str(),
                RUN_FLAG,
                self.test_selector.as_str(),
            ])
            .map(OsStr::new)
            .chain(self.extra_args.iter().map(OsString::as_os_str))
            .collect()
    }

    /// Renders the full command line, quoted so that it can be pasted into a shell.
    ///
    /// Arguments that aren't valid UTF-8 are rendered lossily.
    pub fn display_command(&self, command: &RerunCommand) -> String {
        shell_words::join(
            std::iter::once(OsStr::new(command.program()))
                .chain(self.command_args(command))
                .map(OsStr::to_string_lossy),
        )
    }
}

/// The ordered list of invocations to run, one per package with failed tests.
///
/// Specs are sorted by package name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RerunPlan {
    specs: Vec<RerunSpec>,
}

impl RerunPlan {
    /// Plans reruns for the given failures.
    ///
    /// `extra_args` are appended, in order, to every invocation.
    pub fn new(failures: FailureSet, extra_args: &[OsString]) -> Self {
        let specs = failures
            .iter()
            .filter(|(_, tests)| !tests.is_empty())
            .map(|(package_name, tests)| {
                RerunSpec::new(
                    package_name,
                    test_selector(tests.iter().map(String::as_str)),
                    extra_args.to_vec(),
                )
            })
            .collect();
        Self { specs }
    }

    /// Returns the specs, in order.
    pub fn specs(&self) -> &[RerunSpec] {
        &self.specs
    }

    /// Returns the number of invocations.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if there is nothing to rerun.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
