// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding of `go test -json` events.
//!
//! Each line of the stream is one JSON object. Only three fields matter here: `Action`, `Test`
//! and `Package`. Everything else (`Time`, `Output`, `Elapsed`, ...) is ignored.

use crate::errors::EventParseError;
use serde::Deserialize;

/// The action of a test event, reduced to what matters for reruns.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TestAction {
    /// The test passed.
    Pass,

    /// The test (or package, if the test name is empty) failed.
    Fail,

    /// Any other action: `start`, `run`, `output`, `skip`, `pause`, `cont`, `bench`, build events
    /// and actions added by future Go versions.
    #[default]
    #[serde(other)]
    Other,
}

/// A single decoded test event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent {
    /// The action.
    pub action: TestAction,

    /// The name of the test. Empty for package-level events.
    pub test_name: String,

    /// The import path of the package.
    pub package_name: String,
}

// Mirrors Go's decoding rules: missing and null fields are zero values, not errors.
#[derive(Deserialize)]
struct WireEvent {
    #[serde(rename = "Action", default)]
    action: Option<TestAction>,
    #[serde(rename = "Test", default)]
    test: Option<String>,
    #[serde(rename = "Package", default)]
    package: Option<String>,
}

impl TestEvent {
    /// Decodes a single line of `go test -json` output.
    ///
    /// `line_number` is 1-based and only used for error reporting. A trailing `\r` is ignored.
    pub fn parse(line: &[u8], line_number: usize) -> Result<Self, EventParseError> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let wire: WireEvent =
            serde_json::from_slice(line).map_err(|error| EventParseError::new(line_number, error))?;
        Ok(Self {
            action: wire.action.unwrap_or_default(),
            test_name: wire.test.unwrap_or_default(),
            package_name: wire.package.unwrap_or_default(),
        })
    }

    /// Returns the failure signal carried by this event, if any.
    ///
    /// Only failures of a named test count. Package-level failures (for example, build failures)
    /// have an empty test name and can't be rerun selectively.
    pub fn failure_signal(&self) -> Option<FailureSignal<'_>> {
        if self.action == TestAction::Fail && !self.test_name.is_empty() {
            Some(FailureSignal {
                package_name: &self.package_name,
                test_name: &self.test_name,
            })
        } else {
            None
        }
    }
}

/// A named test that failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FailureSignal<'a> {
    /// The package the test belongs to.
    pub package_name: &'a str,

    /// The name of the failed test.
    pub test_name: &'a str,
}
