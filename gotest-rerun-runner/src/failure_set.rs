// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation of failed tests, per package.
//!
//! The main structures in this module are [`FailureSet`], the per-package set of tests to rerun,
//! and [`FailureCollector`], which builds a `FailureSet` out of a stream of `go test -json` events.
//!
//! A failing subtest makes rerunning its parent redundant: rerunning `TestA/Sub1` runs `TestA`
//! as far as needed to reach `Sub1`. So whenever a subtest fails, its immediate parent is dropped
//! from the set, whichever of the two failure events arrived first.

use crate::{
    errors::{EventParseError, ReadEventsError},
    event::TestEvent,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    io::{self, BufRead},
};
use tracing::{debug, warn};

/// The separator between a test and its subtests.
pub const SUBTEST_SEPARATOR: char = '/';

/// Returns the immediate parent of a subtest, or `None` for a top-level test.
///
/// ```
/// use gotest_rerun_runner::failure_set::parent_test_name;
///
/// assert_eq!(parent_test_name("TestA/Sub1/Leaf"), Some("TestA/Sub1"));
/// assert_eq!(parent_test_name("TestA"), None);
/// ```
pub fn parent_test_name(test_name: &str) -> Option<&str> {
    test_name
        .rfind(SUBTEST_SEPARATOR)
        .map(|idx| &test_name[..idx])
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct PackageFailures {
    // The minimal set of tests to rerun.
    tests: BTreeSet<String>,
    // Every test seen as the immediate parent of a failed subtest. These are never rerun on their
    // own, even if their own failure event arrives after the subtest's.
    covered_parents: BTreeSet<String>,
}

impl PackageFailures {
    fn record(&mut self, test_name: &str) {
        if let Some(parent) = parent_test_name(test_name) {
            self.tests.remove(parent);
            if !self.covered_parents.contains(parent) {
                self.covered_parents.insert(parent.to_owned());
            }
        }

        if !self.covered_parents.contains(test_name) && !self.tests.contains(test_name) {
            self.tests.insert(test_name.to_owned());
        }
    }
}

/// The tests to rerun, grouped by package.
///
/// Packages and tests are iterated in lexicographic order.
///
/// Invariant: a package's set never contains both a test and one of its immediate subtests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureSet {
    packages: BTreeMap<String, PackageFailures>,
}

impl FailureSet {
    /// Creates a new, empty `FailureSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed test.
    ///
    /// Recording the same test twice is a no-op.
    pub fn record_failure(&mut self, package_name: &str, test_name: &str) {
        self.packages
            .entry(package_name.to_owned())
            .or_default()
            .record(test_name);
    }

    /// Returns true if there is nothing to rerun.
    pub fn is_empty(&self) -> bool {
        self.packages.values().all(|package| package.tests.is_empty())
    }

    /// Returns the number of packages with at least one test to rerun.
    pub fn package_count(&self) -> usize {
        self.packages
            .values()
            .filter(|package| !package.tests.is_empty())
            .count()
    }

    /// Returns the total number of tests to rerun, across all packages.
    pub fn test_count(&self) -> usize {
        self.packages
            .values()
            .map(|package| package.tests.len())
            .sum()
    }

    /// Returns the tests to rerun for a package.
    pub fn tests_for(&self, package_name: &str) -> Option<&BTreeSet<String>> {
        self.packages
            .get(package_name)
            .map(|package| &package.tests)
    }

    /// Iterates over packages and their tests, in order. Packages with nothing to rerun are
    /// included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> + '_ {
        self.packages
            .iter()
            .map(|(package_name, package)| (package_name.as_str(), &package.tests))
    }
}

impl<'a> Extend<(&'a str, &'a str)> for FailureSet {
    fn extend<T: IntoIterator<Item = (&'a str, &'a str)>>(&mut self, iter: T) {
        for (package_name, test_name) in iter {
            self.record_failure(package_name, test_name);
        }
    }
}

/// Builds a [`FailureSet`] out of `go test -json` output, one line at a time.
#[derive(Debug, Default)]
pub struct FailureCollector {
    failures: FailureSet,
    lines_read: usize,
    invalid_lines: usize,
}

impl FailureCollector {
    /// Creates a new collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes the next line of the stream.
    ///
    /// Returns an error if the line isn't a valid event. The line still counts towards line
    /// numbering, and the collector stays usable.
    pub fn process_line(&mut self, line: &[u8]) -> Result<(), EventParseError> {
        self.lines_read += 1;
        let event = match TestEvent::parse(line, self.lines_read) {
            Ok(event) => event,
            Err(error) => {
                self.invalid_lines += 1;
                return Err(error);
            }
        };

        if let Some(signal) = event.failure_signal() {
            debug!(
                "recording failure of {} in {}",
                signal.test_name, signal.package_name
            );
            self.failures
                .record_failure(signal.package_name, signal.test_name);
        }
        Ok(())
    }

    /// Reads the entire stream, then returns the collected failures.
    ///
    /// Invalid lines are reported as warnings and skipped. An I/O error while reading is fatal.
    pub fn read_all(mut self, mut reader: impl BufRead) -> Result<FailureSet, ReadEventsError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(ReadEventsError::new(self.lines_read + 1, error)),
            }

            let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
            if let Err(error) = self.process_line(line) {
                warn!(
                    "skipping invalid JSON on line {}: {}",
                    error.line_number(),
                    error.error()
                );
            }
        }

        debug!(
            "read {} lines ({} invalid), {} tests to rerun in {} packages",
            self.lines_read,
            self.invalid_lines,
            self.failures.test_count(),
            self.failures.package_count()
        );
        Ok(self.finish())
    }

    /// Returns the number of lines processed so far.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Returns the number of lines that couldn't be decoded so far.
    pub fn invalid_lines(&self) -> usize {
        self.invalid_lines
    }

    /// Consumes the collector, returning the failures collected so far.
    pub fn finish(self) -> FailureSet {
        self.failures
    }
}
