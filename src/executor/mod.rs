//! A tool for executing external commands with a timeout.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Runs one external command to completion.
///
/// The process is killed if the timeout expires or the owning future is
/// dropped mid-run.
#[derive(Debug, Clone, PartialEq)]
pub struct Executor {
    /// The path to the command executable.
    pub executable_path: PathBuf,
    /// The timeout for the process.
    pub timeout: Duration,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
}

/// Represents the output of a finished process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// The stdout of the process.
    pub stdout: String,
    /// The stderr of the process.
    pub stderr: String,
    /// The exit code of the process.
    pub code: i32,
}

impl Executor {
    /// Executes the command and returns the output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the process exceeds the configured
    /// timeout, and [`Error::Command`] if it exits non-zero.
    pub async fn execute(&self) -> Result<ProcessOutput> {
        tracing::debug!(executable = ?self.executable_path, args = ?self.args, "executing command");

        let mut command = tokio::process::Command::new(&self.executable_path);
        command.args(&self.args);
        command.stdout(std::process::Stdio::piped());
        command.stderr(std::process::Stdio::piped());
        // Reaps the process if the timeout fires or the caller abandons us.
        command.kill_on_drop(true);

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(0x08000000);
        }

        let child = command.spawn()?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "process timed out, killing it");
                return Err(Error::Timeout(self.timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let code = output.status.code().unwrap_or(-1);

        if output.status.success() {
            return Ok(ProcessOutput {
                stdout,
                stderr,
                code,
            });
        }

        Err(Error::Command(format!(
            "Process failed with code {}: {}",
            code, stderr
        )))
    }
}
