//! Command execution channel for clusterwatch
//!
//! Every external call (kubectl on the local host, ssh towards nodes) goes
//! through [`CommandRunner`] so the probing and parsing logic can run against
//! scripted transports in tests:
//! - Process-backed runner with a hard timeout
//! - Captured stdout/stderr and exit code
//! - Child processes killed when the call is dropped

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::error::ExecError;

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turns a non-zero exit into [`ExecError::Failed`]
    pub fn into_success(self, program: &str) -> Result<Self, ExecError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ExecError::Failed {
                program: program.to_string(),
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Narrow remote/local execution interface: `run(command, args) -> output`
///
/// A non-zero exit status is reported through [`CommandOutput::exit_code`],
/// not as an error. Errors are reserved for "the command never ran to
/// completion" (spawn failure, timeout).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError>;
}

/// Runs commands as child processes, bounded by a timeout
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        let start_time = Instant::now();
        debug!("Executing {} {:?} (timeout: {:?})", program, args, self.timeout);

        let child = AsyncCommand::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::Timeout {
                program: program.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        debug!(
            "{} finished with {:?} in {}ms",
            program,
            output.status.code(),
            start_time.elapsed().as_millis()
        );

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_process_runner_captures_stdout() {
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let output = runner.run("sh", &args(&["-c", "echo 'Hello World'"])).await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "Hello World");
    }

    #[tokio::test]
    async fn test_process_runner_reports_exit_code() {
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let output = runner.run("sh", &args(&["-c", "echo oops >&2; exit 3"])).await.unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "oops");

        let err = output.into_success("sh").unwrap_err();
        assert!(matches!(err, ExecError::Failed { code: Some(3), .. }));
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let runner = ProcessRunner::new(Duration::from_millis(200));
        let err = runner.run("sleep", &args(&["10"])).await.unwrap_err();

        assert!(matches!(err, ExecError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = ProcessRunner::new(Duration::from_secs(1));
        let err = runner
            .run("clusterwatch-definitely-not-a-binary", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
