//! External command capability
//!
//! Discovery and facility checks on some platforms can only ask the OS
//! through its own tools. Running them goes through [`CommandRunner`] so the
//! platform variants can be exercised with canned output.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::DetectError;

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, if the process exited normally
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Convert a non-zero exit into [`DetectError::CommandFailed`]
    pub fn into_result(self, program: &str) -> Result<Self, DetectError> {
        if self.success() {
            Ok(self)
        } else {
            let reason = match self.stderr.trim() {
                "" => format!("exit status {:?}", self.status),
                msg => msg.to_string(),
            };
            Err(DetectError::CommandFailed {
                program: program.to_string(),
                reason,
            })
        }
    }
}

/// Runs an external program and captures its output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, DetectError>;
}

/// Runs real processes with a hard time limit
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, DetectError> {
        debug!("Running {} {:?}", program, args);

        // kill_on_drop reaps the child when the timeout drops the future
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DetectError::ToolUnavailable(program.to_string()));
            }
            Ok(Err(e)) => return Err(DetectError::Io(e)),
            Err(_) => {
                return Err(DetectError::CommandTimeout {
                    program: program.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!("{} exited with {:?}", program, result.status);
        Ok(result)
    }
}
