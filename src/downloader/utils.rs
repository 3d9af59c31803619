// Process execution helpers shared by the extractor and the download executor

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use super::errors::ExtractError;
use super::traits::{ProcessOutput, ProcessRunner, StderrSink};

/// Run command with timeout, forwarding stderr lines to `sink` as they
/// arrive while still capturing them.
pub async fn run_output_with_timeout(
    program: &Path,
    args: &[String],
    timeout_dur: Duration,
    sink: Option<StderrSink>,
) -> Result<ProcessOutput, ExtractError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ExtractError::ToolNotFound(format!("{}: {}", program.display(), e))
            }
            _ => ExtractError::Spawn(format!("Failed to start {}: {}", program.display(), e)),
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ExtractError::Spawn(format!("Failed to capture stdout from {}", program.display())))?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ExtractError::Spawn(format!("Failed to capture stderr from {}", program.display())))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stdout: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut reader = BufReader::new(stderr_pipe);
        let mut buf = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(|e| format!("Failed to read stderr: {}", e))?;
            if read == 0 {
                break;
            }
            if let Some(sink) = &sink {
                let text = String::from_utf8_lossy(&line);
                sink(text.trim_end());
            }
            buf.extend_from_slice(&line);
        }
        Ok::<Vec<u8>, String>(buf)
    });

    match timeout(timeout_dur, child.wait()).await {
        Ok(status_res) => {
            let status = status_res
                .map_err(|e| ExtractError::Spawn(format!("Failed to wait for {}: {}", program.display(), e)))?;
            let stdout = stdout_task
                .await
                .map_err(|e| ExtractError::Spawn(format!("stdout task failed: {}", e)))?
                .map_err(ExtractError::Spawn)?;
            let stderr = stderr_task
                .await
                .map_err(|e| ExtractError::Spawn(format!("stderr task failed: {}", e)))?
                .map_err(ExtractError::Spawn)?;
            Ok(ProcessOutput {
                success: status.success(),
                code: status.code(),
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ExtractError::Timeout(timeout_dur.as_secs()))
        }
    }
}

/// `ProcessRunner` backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
        stderr_sink: Option<StderrSink>,
    ) -> Result<ProcessOutput, ExtractError> {
        tracing::debug!(program = %program.display(), args = %args.join(" "), "spawning");
        run_output_with_timeout(program, args, timeout, stderr_sink).await
    }
}

/// Sink that forwards every stderr line to the debug log
pub fn tracing_sink() -> StderrSink {
    std::sync::Arc::new(|line: &str| {
        if !line.is_empty() {
            tracing::debug!(target: "ytdl::extractor", "{}", line);
        }
    })
}
