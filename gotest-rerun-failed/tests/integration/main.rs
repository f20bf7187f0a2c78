// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the `gotest-rerun-failed` binary.
//!
//! `GOTEST_RERUN_GO` stands in for `go`: `true` and `false` make every rerun pass or fail, and
//! `sh -c` scripts inspect the arguments a rerun receives.

#![cfg(unix)]

use fixtures::RerunFailedCli;
use indoc::indoc;

mod fixtures;

#[test]
fn single_failure_is_rerun() {
    let output = RerunFailedCli::new()
        .go("true")
        .stdin(r#"{"Action":"fail","Test":"TestA","Package":"pkgX"}"#)
        .output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    let stderr = output.stderr();
    assert!(stderr.contains("Rerunning failed tests:"), "{output:?}");
    assert!(stderr.contains("true test pkgX -run "), "{output:?}");
    assert!(stderr.contains("^TestA$"), "{output:?}");
}

#[test]
fn subtest_replaces_parent() {
    let output = RerunFailedCli::new()
        .go(r#"sh -c 'printf "%s\n" "$@"' sh"#)
        .stdin(indoc! {r#"
            {"Action":"fail","Test":"TestA","Package":"pkgX"}
            {"Action":"fail","Test":"TestA/Sub1","Package":"pkgX"}
        "#})
        .output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    assert_eq!(
        output.stdout().lines().collect::<Vec<_>>(),
        ["test", "pkgX", "-run", "^TestA/Sub1$"],
        "{output:?}"
    );
}

#[test]
fn arguments_are_passed_through() {
    let output = RerunFailedCli::new()
        .go(r#"sh -c 'printf "%s\n" "$@"' sh"#)
        .args(["-v", "-count=1", "--help"])
        .stdin(r#"{"Action":"fail","Test":"Test.A","Package":"pkgX"}"#)
        .output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    assert_eq!(
        output.stdout().lines().collect::<Vec<_>>(),
        ["test", "pkgX", "-run", r"^Test\.A$", "-v", "-count=1", "--help"],
        "{output:?}"
    );
}

#[test]
fn leading_double_dash_is_passed_through() {
    let output = RerunFailedCli::new()
        .go(r#"sh -c 'printf "%s\n" "$@"' sh"#)
        .args(["--", "-h"])
        .stdin(r#"{"Action":"fail","Test":"TestA","Package":"pkgX"}"#)
        .output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    assert_eq!(
        output.stdout().lines().collect::<Vec<_>>(),
        ["test", "pkgX", "-run", "^TestA$", "--", "-h"],
        "{output:?}"
    );
}

#[test]
fn packages_are_announced_in_order() {
    let output = RerunFailedCli::new()
        .go("true")
        .stdin(indoc! {r#"
            {"Action":"fail","Test":"TestB","Package":"pkgY"}
            {"Action":"fail","Test":"TestA","Package":"pkgX"}
        "#})
        .output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    let stderr = output.stderr();
    let pkg_x = stderr.find("true test pkgX").expect("pkgX is announced");
    let pkg_y = stderr.find("true test pkgY").expect("pkgY is announced");
    assert!(pkg_x < pkg_y, "{output:?}");
}

#[test]
fn empty_input() {
    let output = RerunFailedCli::new().go("false").stdin("").output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    assert!(
        output.stderr().contains("info: no failed tests found"),
        "{output:?}"
    );
    assert!(!output.stderr().contains("Rerunning"), "{output:?}");
}

#[test]
fn only_passing_and_package_events() {
    let output = RerunFailedCli::new()
        .go("false")
        .stdin(indoc! {r#"
            {"Action":"pass","Test":"TestA","Package":"pkgX"}
            {"Action":"fail","Package":"pkgY"}
            {"Action":"build-fail","ImportPath":"pkgZ [pkgZ.test]"}
        "#})
        .output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    assert!(
        output.stderr().contains("no failed tests found"),
        "{output:?}"
    );
}

#[test]
fn invalid_line_is_skipped() {
    let output = RerunFailedCli::new()
        .go("true")
        .stdin(indoc! {r#"
            FAIL	pkgX [build failed]
            {"Action":"fail","Test":"TestA","Package":"pkgX"}
        "#})
        .output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    let stderr = output.stderr();
    assert!(
        stderr.contains("warning: skipping invalid JSON on line 1"),
        "{output:?}"
    );
    assert!(stderr.contains("true test pkgX -run "), "{output:?}");
}

#[test]
fn failed_rerun() {
    let output = RerunFailedCli::new()
        .go(r#"sh -c '[ "$2" != pkgY ]' sh"#)
        .stdin(indoc! {r#"
            {"Action":"fail","Test":"TestA","Package":"pkgX"}
            {"Action":"fail","Test":"TestB","Package":"pkgY"}
        "#})
        .output();

    assert_eq!(output.exit_code(), Some(1), "{output:?}");
    let stderr = output.stderr();
    assert!(
        stderr.contains("error: rerun for pkgY failed with exit code 1"),
        "{output:?}"
    );
    assert!(
        stderr.contains("error: rerun failed for 1 of 2 packages: pkgY"),
        "{output:?}"
    );
}

#[test]
fn missing_program() {
    let output = RerunFailedCli::new()
        .go("gotest-rerun-this-program-does-not-exist")
        .stdin(r#"{"Action":"fail","Test":"TestA","Package":"pkgX"}"#)
        .output();

    assert_eq!(output.exit_code(), Some(1), "{output:?}");
    assert!(
        output.stderr().contains("failed to execute"),
        "{output:?}"
    );
}

#[test]
fn empty_go_command() {
    let output = RerunFailedCli::new()
        .go("  ")
        .stdin(r#"{"Action":"fail","Test":"TestA","Package":"pkgX"}"#)
        .output();

    assert_eq!(output.exit_code(), Some(1), "{output:?}");
    assert!(
        output.stderr().contains("did not contain a program"),
        "{output:?}"
    );
}

#[test]
fn help() {
    for flag in ["-h", "--help"] {
        let output = RerunFailedCli::new().go("false").args([flag]).output();

        assert_eq!(output.exit_code(), Some(0), "{output:?}");
        let stderr = output.stderr();
        assert!(
            stderr.contains("go test -json ./... | gotest-rerun-failed"),
            "{output:?}"
        );
        assert!(stderr.contains("GOTEST_RERUN_GO"), "{output:?}");
    }
}

#[test]
fn invalid_color_falls_back() {
    let output = RerunFailedCli::new()
        .go("true")
        .env("GOTEST_RERUN_COLOR", "sometimes")
        .stdin("")
        .output();

    assert_eq!(output.exit_code(), Some(0), "{output:?}");
    assert!(
        output
            .stderr()
            .contains("warning: ignoring invalid GOTEST_RERUN_COLOR value `sometimes`"),
        "{output:?}"
    );
}
