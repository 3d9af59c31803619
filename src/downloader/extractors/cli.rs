// Extractor client - dumps consolidated JSON metadata for a link
//
// One child process per call. The playlist knobs in the option store are
// never forwarded: the full playlist is always dumped and slicing happens
// locally, so the cached record stays complete.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::diagnostics::{diagnostic_lines, is_warning};
use crate::downloader::errors::ExtractError;
use crate::downloader::models::Metadata;
use crate::downloader::options::OptionStore;
use crate::downloader::traits::{ProcessRunner, StderrSink};

/// Raw extraction result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// `None` when the extractor printed nothing or `null`
    pub metadata: Option<Metadata>,
    /// Stderr lines emitted alongside usable output
    pub diagnostics: Vec<String>,
}

/// Runs the extractor in metadata-dump mode
#[derive(Clone)]
pub struct ExtractorClient {
    program: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
    stderr_sink: Option<StderrSink>,
}

impl ExtractorClient {
    pub fn new(program: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            runner,
            timeout,
            stderr_sink: None,
        }
    }

    pub fn with_stderr_sink(mut self, sink: Option<StderrSink>) -> Self {
        self.stderr_sink = sink;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn runner(&self) -> &Arc<dyn ProcessRunner> {
        &self.runner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn stderr_sink(&self) -> Option<StderrSink> {
        self.stderr_sink.clone()
    }

    /// Build command arguments
    pub fn build_args(link: &str, options: &OptionStore) -> Vec<String> {
        let mut args = options.extractor_args();
        args.push("--dump-single-json".to_string());
        args.push("--".to_string());
        args.push(link.to_string());
        args
    }

    /// Dump metadata for `link`. The record is returned unsanitized.
    ///
    /// Stderr output is advisory when stdout holds a JSON record, and
    /// fatal when it does not.
    pub async fn extract(&self, link: &str, options: &OptionStore) -> Result<Extraction, ExtractError> {
        let args = Self::build_args(link, options);
        tracing::info!(link, "extracting metadata");

        let output = self
            .runner
            .run(&self.program, &args, self.timeout, self.stderr_sink.clone())
            .await?;

        let stderr = output.stderr_text();
        let diagnostics = diagnostic_lines(&stderr);

        let metadata = match parse_json_output(&output.stdout_text()) {
            Ok(metadata) => metadata,
            Err(e) if output.success => {
                tracing::warn!(link, error = %e, "extractor output is not a metadata record");
                return Err(e);
            }
            Err(_) => return Err(ExtractError::process_failed(output.code, &stderr)),
        };

        if metadata.is_none() && !output.success {
            return Err(ExtractError::process_failed(output.code, &stderr));
        }

        if !output.success {
            tracing::warn!(link, code = ?output.code, "extractor exited with failure but produced metadata");
        }
        for line in diagnostics.iter().filter(|l| !is_warning(l)) {
            tracing::warn!(link, "{}", line);
        }

        Ok(Extraction { metadata, diagnostics })
    }
}

/// Parse extractor stdout into a record.
///
/// Empty output and a literal `null` mean "no metadata". When the whole
/// output is not one JSON document, the last non-empty line is tried,
/// since the extractor prints one JSON line per finished item.
pub fn parse_json_output(stdout: &str) -> Result<Option<Metadata>, ExtractError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }

    let parsed = Metadata::from_json(trimmed).or_else(|first_err| {
        match trimmed.lines().map(str::trim).filter(|l| !l.is_empty()).last() {
            Some(last) if last != trimmed => Metadata::from_json(last),
            _ => Err(first_err),
        }
    })?;

    Ok(if parsed.is_empty() { None } else { Some(parsed) })
}
