//! Child process execution for the external encoder.
//!
//! Runs `ffmpeg`/`ffprobe` with captured output and a hard deadline. The
//! child is killed when the deadline passes or the future is dropped.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, error};

use crate::error::{MediaError, MediaResult};

/// Captured output of a successful run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Runs one program with a fixed deadline per invocation.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run with `args`, failing on spawn errors, timeouts and non-zero exits.
    pub async fn run<I, S>(&self, args: I) -> MediaResult<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program, "Running encoder command");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                error!(program = %self.program, error = %source, "Failed to start encoder");
                return Err(MediaError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                error!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs(),
                    "Encoder timed out"
                );
                return Err(MediaError::Timeout {
                    program: self.program.clone(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            error!(
                program = %self.program,
                code,
                stderr = %stderr.chars().take(500).collect::<String>(),
                "Encoder exited with failure"
            );
            return Err(MediaError::ProcessFailed {
                program: self.program.clone(),
                code,
                stderr: stderr.chars().take(2000).collect(),
            });
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(program = %self.program, duration_ms, "Encoder command finished");

        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr,
            duration_ms,
        })
    }
}
