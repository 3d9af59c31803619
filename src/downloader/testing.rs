// Scripted process runner for tests

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::ExtractError;
use super::traits::{ProcessOutput, ProcessRunner, StderrSink};

pub struct Script;

impl Script {
    pub fn ok(stdout: &str, stderr: &str) -> Result<ProcessOutput, ExtractError> {
        Ok(ProcessOutput {
            success: true,
            code: Some(0),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        })
    }

    pub fn fail(code: i32, stdout: &str, stderr: &str) -> Result<ProcessOutput, ExtractError> {
        Ok(ProcessOutput {
            success: false,
            code: Some(code),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        })
    }
}

type Handler = Box<dyn Fn(&[String]) -> Result<ProcessOutput, ExtractError> + Send + Sync>;

/// Either replays queued results in order or answers through a handler.
/// Every invocation's arguments are recorded.
pub struct FakeRunner {
    queue: Mutex<VecDeque<Result<ProcessOutput, ExtractError>>>,
    handler: Option<Handler>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn new(scripts: Vec<Result<ProcessOutput, ExtractError>>) -> Self {
        Self {
            queue: Mutex::new(scripts.into()),
            handler: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_handler(
        handler: impl Fn(&[String]) -> Result<ProcessOutput, ExtractError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            handler: Some(Box::new(handler)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(
        &self,
        _program: &Path,
        args: &[String],
        _timeout: Duration,
        stderr_sink: Option<StderrSink>,
    ) -> Result<ProcessOutput, ExtractError> {
        self.calls.lock().unwrap().push(args.to_vec());

        let result = match &self.handler {
            Some(handler) => handler(args),
            None => self
                .queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ExtractError::Spawn("no scripted output left".to_string()))),
        };

        if let (Some(sink), Ok(output)) = (&stderr_sink, &result) {
            for line in output.stderr_text().lines() {
                sink(line);
            }
        }

        result
    }
}

/// Value following `flag` in an argument list
pub fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
