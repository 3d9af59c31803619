// Download executor - fetches media for one already-extracted entry
//
// The entry's metadata is handed to the extractor through a temporary
// info file, so no second metadata extraction happens. Failures never
// escape: they are appended to the caller's error list and the returned
// record carries no local filename.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;

use super::errors::ExtractError;
use super::extractors::{parse_json_output, ExtractorClient};
use super::models::{Metadata, FILENAME_FIELD};
use super::options::{OptionStore, OUTPUT};
use super::traits::{ProcessRunner, Slugifier, StderrSink};

const OUTPUT_EXT_TEMPLATE: &str = "%(ext)s";

/// Runs the extractor in load-info-and-fetch mode, one entry per call
#[derive(Clone)]
pub struct DownloadExecutor {
    program: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
    stderr_sink: Option<StderrSink>,
    slugifier: Arc<dyn Slugifier>,
    temp_dir: Option<PathBuf>,
}

impl DownloadExecutor {
    pub fn new(
        program: impl Into<PathBuf>,
        runner: Arc<dyn ProcessRunner>,
        timeout: Duration,
        slugifier: Arc<dyn Slugifier>,
    ) -> Self {
        Self {
            program: program.into(),
            runner,
            timeout,
            stderr_sink: None,
            slugifier,
            temp_dir: None,
        }
    }

    /// Share the extractor client's program, runner, timeout and sink.
    pub fn from_client(client: &ExtractorClient, slugifier: Arc<dyn Slugifier>) -> Self {
        Self {
            program: client.program().to_path_buf(),
            runner: Arc::clone(client.runner()),
            timeout: client.timeout(),
            stderr_sink: client.stderr_sink(),
            slugifier,
            temp_dir: None,
        }
    }

    pub fn with_stderr_sink(mut self, sink: Option<StderrSink>) -> Self {
        self.stderr_sink = sink;
        self
    }

    /// Directory for temporary info files; the system temp dir when unset.
    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    /// Default output path: `<target_dir>/<slug(title)>.%(ext)s`
    pub fn output_template(&self, entry: &Metadata, target_dir: &Path) -> String {
        let stem = self.slugifier.slugify(entry.title().unwrap_or_default());
        target_dir
            .join(format!("{}.{}", stem, OUTPUT_EXT_TEMPLATE))
            .to_string_lossy()
            .into_owned()
    }

    /// Build command arguments
    pub fn build_args(
        &self,
        info_path: &Path,
        entry: &Metadata,
        options: &OptionStore,
        target_dir: &Path,
    ) -> Vec<String> {
        let mut args = options.extractor_args();
        args.push("--load-info-json".to_string());
        args.push(info_path.to_string_lossy().into_owned());
        args.push("--print-json".to_string());

        if !options.is_set(OUTPUT) {
            args.push(format!("--{}", OUTPUT));
            args.push(self.output_template(entry, target_dir));
        }

        args
    }

    /// Download one entry and return the extractor's post-download record.
    ///
    /// Never fails: problems are appended to `errors` and the returned
    /// record lacks `_filename`. When the info file cannot be written the
    /// original entry comes back untouched.
    pub async fn download_one(
        &self,
        entry: &Metadata,
        options: &OptionStore,
        target_dir: &Path,
        errors: &mut Vec<String>,
    ) -> Metadata {
        let label = entry_label(entry);

        let info_file = match write_info_file(entry, self.temp_dir.as_deref()) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(entry = %label, error = %e, "cannot write temporary info file");
                errors.push(format!("{}: cannot write temporary metadata file: {}", label, e));
                return entry.clone();
            }
        };

        let args = self.build_args(info_file.path(), entry, options, target_dir);
        tracing::info!(entry = %label, "downloading");

        let result = self
            .runner
            .run(&self.program, &args, self.timeout, self.stderr_sink.clone())
            .await;

        if let Err(e) = info_file.close() {
            tracing::debug!(entry = %label, error = %e, "temporary info file cleanup failed");
        }

        let output = match result {
            Ok(output) => output,
            Err(e) => return failed(entry, None, &label, e, errors),
        };

        let echoed = parse_json_output(&output.stdout_text());

        if !output.success {
            let err = ExtractError::process_failed(output.code, &output.stderr_text());
            return failed(entry, echoed.ok().flatten(), &label, err, errors);
        }

        match echoed {
            Ok(Some(downloaded)) => {
                tracing::info!(entry = %label, file = downloaded.filename().unwrap_or("?"), "downloaded");
                downloaded
            }
            Ok(None) => failed(
                entry,
                None,
                &label,
                ExtractError::Parse("extractor echoed no metadata".to_string()),
                errors,
            ),
            Err(e) => failed(entry, None, &label, e, errors),
        }
    }
}

fn write_info_file(entry: &Metadata, dir: Option<&Path>) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("ytdl-info-").suffix(".json");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    let body = entry
        .to_json()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    file.write_all(body.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn failed(
    entry: &Metadata,
    partial: Option<Metadata>,
    label: &str,
    err: ExtractError,
    errors: &mut Vec<String>,
) -> Metadata {
    tracing::warn!(entry = %label, error = %err, "download failed");
    errors.push(format!("{}: {}", label, err));

    let mut result = partial.unwrap_or_else(|| entry.clone());
    result.remove(FILENAME_FIELD);
    result
}

fn entry_label(entry: &Metadata) -> String {
    entry
        .title()
        .or_else(|| entry.get_str("id"))
        .unwrap_or("untitled entry")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::slug::DefaultSlugifier;
    use crate::downloader::testing::{arg_value, FakeRunner, Script};
    use serde_json::json;
    use std::sync::Mutex;

    fn executor(runner: Arc<FakeRunner>) -> DownloadExecutor {
        DownloadExecutor::new("yt-dlp", runner, Duration::from_secs(5), Arc::new(DefaultSlugifier))
    }

    fn entry(title: &str) -> Metadata {
        Metadata::from_value(json!({
            "id": title.to_lowercase(),
            "title": title,
            "url": "https://cdn.example/x",
            "format_id": "18",
            "_filename": "stale.mp4"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_echoed_record_and_removes_info_file() {
        let seen_path = Arc::new(Mutex::new(None::<String>));
        let seen = Arc::clone(&seen_path);
        let runner = Arc::new(FakeRunner::with_handler(move |args| {
            let path = arg_value(args, "--load-info-json").unwrap().to_string();
            let loaded = std::fs::read_to_string(&path).unwrap();
            assert!(loaded.contains("\"Song One\""));
            *seen.lock().unwrap() = Some(path);
            Script::ok("{\"title\": \"Song One\", \"ext\": \"webm\", \"_filename\": \"/music/Song-One.webm\"}\n", "")
        }));

        let mut errors = Vec::new();
        let got = executor(runner.clone())
            .download_one(&entry("Song One"), &OptionStore::new(), Path::new("/music"), &mut errors)
            .await;

        assert!(errors.is_empty());
        assert_eq!(got.filename(), Some("/music/Song-One.webm"));
        assert_eq!(got.get_str("ext"), Some("webm"));

        let path = seen_path.lock().unwrap().clone().unwrap();
        assert!(!Path::new(&path).exists());

        let args = &runner.calls()[0];
        assert_eq!(arg_value(args, "--output"), Some("/music/Song-One.%(ext)s"));
        assert!(args.contains(&"--print-json".to_string()));
    }

    #[tokio::test]
    async fn test_explicit_output_option_is_respected() {
        let runner = Arc::new(FakeRunner::new(vec![Script::ok("{\"title\": \"x\", \"_filename\": \"a\"}", "")]));
        let mut opts = OptionStore::new();
        opts.set(OUTPUT, "/tmp/%(id)s.%(ext)s");

        let mut errors = Vec::new();
        executor(runner.clone())
            .download_one(&entry("x"), &opts, Path::new("/ignored"), &mut errors)
            .await;

        let args = &runner.calls()[0];
        assert_eq!(args.iter().filter(|a| *a == "--output").count(), 1);
        assert_eq!(arg_value(args, "--output"), Some("/tmp/%(id)s.%(ext)s"));
    }

    #[tokio::test]
    async fn test_process_failure_strips_filename() {
        let runner = Arc::new(FakeRunner::new(vec![Script::fail(
            1,
            "",
            "ERROR: HTTP Error 403: Forbidden\n",
        )]));

        let mut errors = Vec::new();
        let got = executor(runner)
            .download_one(&entry("Bad"), &OptionStore::new(), Path::new("/music"), &mut errors)
            .await;

        assert!(got.filename().is_none());
        assert_eq!(got.title(), Some("Bad"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Bad: "));
        assert!(errors[0].contains("access denied"));
    }

    #[tokio::test]
    async fn test_partial_echo_on_failure_strips_filename() {
        let runner = Arc::new(FakeRunner::new(vec![Script::fail(
            1,
            "{\"title\": \"Half\", \"_filename\": \"/music/Half.part\"}",
            "ERROR: interrupted\n",
        )]));

        let mut errors = Vec::new();
        let got = executor(runner)
            .download_one(&entry("Half"), &OptionStore::new(), Path::new("/music"), &mut errors)
            .await;

        assert!(got.filename().is_none());
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_recorded_not_raised() {
        let runner = Arc::new(FakeRunner::new(vec![Err(ExtractError::Timeout(5))]));
        let mut errors = Vec::new();
        let got = executor(runner)
            .download_one(&entry("Slow"), &OptionStore::new(), Path::new("/music"), &mut errors)
            .await;

        assert!(got.filename().is_none());
        assert!(errors[0].contains("timed out"));
    }

    #[tokio::test]
    async fn test_info_file_failure_keeps_entry_and_siblings() {
        let runner = Arc::new(FakeRunner::with_handler(|args| {
            let path = arg_value(args, "--load-info-json").unwrap();
            let mut loaded: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
            loaded["_filename"] = json!(format!("/music/{}.mp4", loaded["title"].as_str().unwrap()));
            Script::ok(&format!("{}\n", loaded), "")
        }));
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let good = executor(runner.clone());
        let broken = executor(runner.clone()).with_temp_dir(Some(blocker));

        let mut errors = Vec::new();
        let first = good.download_one(&entry("A"), &OptionStore::new(), Path::new("/music"), &mut errors).await;
        let second = broken.download_one(&entry("B"), &OptionStore::new(), Path::new("/music"), &mut errors).await;
        let third = good.download_one(&entry("C"), &OptionStore::new(), Path::new("/music"), &mut errors).await;

        assert_eq!(first.filename(), Some("/music/A.mp4"));
        assert_eq!(second, entry("B"));
        assert_eq!(third.filename(), Some("/music/C.mp4"));

        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("B: cannot write temporary metadata file"));
        assert_eq!(runner.calls().len(), 2);
    }
}
