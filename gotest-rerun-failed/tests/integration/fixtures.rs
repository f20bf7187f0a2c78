// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{ffi::OsString, fmt, process::Output};

/// A builder for invocations of the `gotest-rerun-failed` binary.
pub struct RerunFailedCli {
    args: Vec<String>,
    envs: Vec<(OsString, OsString)>,
    stdin: Vec<u8>,
}

impl RerunFailedCli {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: vec![("GOTEST_RERUN_COLOR".into(), "never".into())],
            stdin: Vec::new(),
        }
    }

    pub fn args(&mut self, args: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable, replacing any earlier value for the same key.
    pub fn env(&mut self, k: impl Into<OsString>, v: impl Into<OsString>) -> &mut Self {
        let k = k.into();
        self.envs.retain(|(existing, _)| *existing != k);
        self.envs.push((k, v.into()));
        self
    }

    /// Sets the program used for reruns.
    pub fn go(&mut self, go: &str) -> &mut Self {
        self.env("GOTEST_RERUN_GO", go)
    }

    pub fn stdin(&mut self, stdin: impl Into<Vec<u8>>) -> &mut Self {
        self.stdin = stdin.into();
        self
    }

    pub fn output(&self) -> RerunFailedOutput {
        let mut expr = duct::cmd(env!("CARGO_BIN_EXE_gotest-rerun-failed"), &self.args)
            .stdin_bytes(self.stdin.clone())
            .env_remove("GOTEST_RERUN_LOG")
            .stdout_capture()
            .stderr_capture()
            .unchecked();
        for (k, v) in &self.envs {
            expr = expr.env(k, v);
        }
        let output = expr.run().expect("failed to execute gotest-rerun-failed");

        RerunFailedOutput {
            args: self.args.clone(),
            output,
        }
    }
}

pub struct RerunFailedOutput {
    args: Vec<String>,
    output: Output,
}

impl RerunFailedOutput {
    pub fn exit_code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }
}

impl fmt::Debug for RerunFailedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "args: {:?}", self.args)?;
        writeln!(f, "exit status: {}", self.output.status)?;
        writeln!(f, "--- stdout ---\n{}", self.stdout())?;
        writeln!(f, "--- stderr ---\n{}", self.stderr())
    }
}
