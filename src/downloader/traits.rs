// Collaborator traits for process execution and file naming

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::ExtractError;

/// Receives stderr lines of a running child as they arrive
pub type StderrSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Captured result of one finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs an external program to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, killing it once `timeout` elapses.
    ///
    /// Errors only when the process cannot be run or times out; a
    /// non-zero exit is reported through `ProcessOutput::success`.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
        stderr_sink: Option<StderrSink>,
    ) -> Result<ProcessOutput, ExtractError>;
}

/// Turns arbitrary titles into safe file name stems
pub trait Slugifier: Send + Sync {
    fn slugify(&self, input: &str) -> String;
}
