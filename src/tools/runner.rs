//! Subprocess runner backed by `tokio::process::Command`.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::ToolError;

/// A program and the full argument vector it will be started with
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Arguments as lossy strings, for logging and assertions
    pub fn display_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Record of one completed tool run
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub command: ToolCommand,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ToolInvocation {
    /// Log a finished run under `stage`; the tool's own output goes to debug.
    pub fn log(&self, stage: &'static str) {
        info!(
            stage,
            program = %self.command.program,
            exit_code = self.exit_code,
            duration_ms = self.duration.as_millis() as u64,
            "tool finished"
        );
        debug!(
            stage,
            stdout = %String::from_utf8_lossy(&self.stdout),
            stderr = %String::from_utf8_lossy(&self.stderr),
            "tool output"
        );
    }
}

/// Runs tool commands with a bounded wait
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command` to completion and check that it wrote a non-empty
    /// file at `expected_output`.
    ///
    /// The child is killed if it outlives the timeout.
    pub async fn run(
        &self,
        command: &ToolCommand,
        expected_output: &Path,
    ) -> Result<ToolInvocation, ToolError> {
        let start = Instant::now();
        let program = command.program.clone();

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %program, args = ?command.display_args(), "spawning tool");

        let child = cmd.spawn().map_err(|source| ToolError::Launch {
            program: program.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ToolError::Wait {
                program: program.clone(),
                source,
            })?,
            Err(_) => {
                warn!(
                    program = %program,
                    timeout_secs = self.timeout.as_secs(),
                    "tool timed out, killing process"
                );
                return Err(ToolError::TimedOut {
                    program,
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let duration = start.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(
                program = %program,
                exit_code,
                stdout = %String::from_utf8_lossy(&output.stdout),
                stderr = %stderr,
                "tool exited with failure"
            );
            return Err(ToolError::NonZeroExit {
                program,
                exit_code,
                stderr,
            });
        }

        let produced = tokio::fs::metadata(expected_output)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(ToolError::MissingOutput {
                program,
                path: expected_output.display().to_string(),
            });
        }

        Ok(ToolInvocation {
            command: command.clone(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
            duration,
        })
    }
}
