// Ytdl - extraction, cache and download orchestration
//
// Flow for one link:
//   cache hit?  -> metadata
//   else        -> extractor dump -> sanitize -> cache write -> metadata
//   download    -> (playlist) resolve indexes -> one executor call per entry
//               -> (single)   one executor call
//
// Everything runs one child process at a time, in resolved order.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::YtdlConfig;
use crate::downloader::cache::MetadataCache;
use crate::downloader::errors::ExtractError;
use crate::downloader::executor::DownloadExecutor;
use crate::downloader::extractors::ExtractorClient;
use crate::downloader::models::{Metadata, Outcome};
use crate::downloader::options::{OptionStore, FORMAT};
use crate::downloader::sanitizer::sanitize;
use crate::downloader::selection::{resolve_indexes, PlaylistSelection};
use crate::downloader::slug::DefaultSlugifier;
use crate::downloader::tools::{extractor_version, locate_extractor};
use crate::downloader::traits::{ProcessRunner, Slugifier, StderrSink};
use crate::downloader::utils::{tracing_sink, TokioProcessRunner};

/// Metadata extracted earlier in this session
#[derive(Debug, Clone)]
struct Session {
    link: String,
    metadata: Metadata,
}

/// Top-level orchestrator around the external extractor
pub struct Ytdl {
    config: YtdlConfig,
    options: OptionStore,
    cache: MetadataCache,
    extractor: ExtractorClient,
    executor: DownloadExecutor,
    session: Option<Session>,
}

impl Ytdl {
    /// Orchestrator backed by real child processes.
    pub fn new(config: YtdlConfig) -> Self {
        Self::with_runner(config, Arc::new(TokioProcessRunner))
    }

    pub fn with_runner(config: YtdlConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let program = locate_extractor(config.extractor_path.as_deref());
        let timeout = Duration::from_secs(config.timeout_secs);

        let extractor = ExtractorClient::new(program, runner, timeout).with_stderr_sink(Some(tracing_sink()));
        let executor = DownloadExecutor::from_client(&extractor, Arc::new(DefaultSlugifier))
            .with_temp_dir(config.temp_dir.clone());
        let cache = MetadataCache::new(&config.cache_dir, config.cache_ttl_secs)
            .with_enabled(config.cache_enabled);

        tracing::debug!(
            extractor = %extractor.program().display(),
            cache = cache.is_enabled(),
            "orchestrator ready"
        );

        let mut ytdl = Self {
            config,
            options: OptionStore::new(),
            cache,
            extractor,
            executor,
            session: None,
        };
        ytdl.ensure_format();
        ytdl
    }

    pub fn with_slugifier(mut self, slugifier: Arc<dyn Slugifier>) -> Self {
        self.executor = DownloadExecutor::from_client(&self.extractor, slugifier)
            .with_temp_dir(self.config.temp_dir.clone());
        self
    }

    /// Replace the sink receiving live stderr lines of every child.
    pub fn with_stderr_sink(mut self, sink: Option<StderrSink>) -> Self {
        self.extractor = self.extractor.with_stderr_sink(sink.clone());
        self.executor = self.executor.with_stderr_sink(sink);
        self
    }

    pub fn with_options(mut self, options: OptionStore) -> Self {
        self.options = options;
        self.ensure_format();
        self
    }

    fn ensure_format(&mut self) {
        if self.options.get(FORMAT).is_none() {
            self.options.set(FORMAT, self.config.default_format.clone());
        }
    }

    pub fn config(&self) -> &YtdlConfig {
        &self.config
    }

    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionStore {
        &mut self.options
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Metadata extracted earlier for `link`, if any.
    pub fn extracted(&self, link: &str) -> Option<&Metadata> {
        self.session
            .as_ref()
            .filter(|s| s.link == link)
            .map(|s| &s.metadata)
    }

    pub fn clear_session(&mut self) {
        self.session = None;
    }

    pub async fn extractor_version(&self) -> Result<String, ExtractError> {
        extractor_version(self.extractor.runner().as_ref(), self.extractor.program()).await
    }

    /// Options as handed to the extractor: a format selector is always
    /// present so single items stay downloadable.
    fn effective_options(&self) -> OptionStore {
        let mut options = self.options.clone();
        if options.get(FORMAT).is_none() {
            options.set(FORMAT, self.config.default_format.clone());
        }
        options
    }

    /// Fetch metadata for `link`, from cache when fresh.
    ///
    /// Never fails: an extractor failure yields an empty record and a
    /// recorded error. An empty record with no errors means the link
    /// had nothing to extract.
    pub async fn extract_infos(&mut self, link: &str) -> Outcome<Metadata> {
        match self.try_extract(link).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(link, error = %e, "extraction failed");
                Outcome::new(Metadata::new(), vec![e.to_string()])
            }
        }
    }

    async fn try_extract(&mut self, link: &str) -> Result<Outcome<Metadata>, ExtractError> {
        let key = MetadataCache::key_for(link);

        if let Some(metadata) = self.cache.load(&key) {
            tracing::info!(link, key = %key, "metadata cache hit");
            self.session = Some(Session {
                link: link.to_string(),
                metadata: metadata.clone(),
            });
            return Ok(Outcome::new(metadata, Vec::new()));
        }

        let extraction = self.extractor.extract(link, &self.effective_options()).await?;
        let metadata = sanitize(extraction.metadata.unwrap_or_default());

        if metadata.is_empty() {
            tracing::info!(link, "extractor found nothing");
        } else if self.cache.is_enabled() && !self.cache.write(&key, &metadata) {
            tracing::warn!(link, "extracted metadata was not cached");
        }

        self.session = Some(Session {
            link: link.to_string(),
            metadata: metadata.clone(),
        });
        Ok(Outcome::new(metadata, extraction.diagnostics))
    }

    /// Download media for `link` into `target_dir`.
    ///
    /// Metadata comes from `metadata` when given, else from this session's
    /// earlier extraction of the same link, else from a fresh
    /// `extract_infos`. `data` is `None` when there is nothing to
    /// download. For playlists the returned record's entries are the
    /// selected entries' post-download records, in processing order.
    pub async fn download(
        &mut self,
        link: &str,
        metadata: Option<Metadata>,
        target_dir: &Path,
    ) -> Outcome<Option<Metadata>> {
        let mut errors = Vec::new();

        let metadata = match metadata {
            Some(explicit) => sanitize(explicit),
            None => match self.extracted(link) {
                Some(known) => known.clone(),
                None => {
                    let extracted = self.extract_infos(link).await;
                    errors.extend(extracted.errors);
                    extracted.data
                }
            },
        };

        if metadata.is_empty() {
            tracing::info!(link, "no data to download");
            return Outcome::new(None, errors);
        }

        let downloaded = self.download_metadata(metadata, target_dir, &mut errors).await;
        Outcome::new(Some(downloaded), errors)
    }

    /// Extract then download. Unlike `extract_infos`, a failure to run the
    /// extractor for the primary extraction terminates the call.
    pub async fn run(
        &mut self,
        link: &str,
        target_dir: &Path,
    ) -> Result<Outcome<Option<Metadata>>, ExtractError> {
        let extracted = self.try_extract(link).await?;
        let mut errors = extracted.errors;

        if extracted.data.is_empty() {
            return Ok(Outcome::new(None, errors));
        }

        let downloaded = self.download_metadata(extracted.data, target_dir, &mut errors).await;
        Ok(Outcome::new(Some(downloaded), errors))
    }

    async fn download_metadata(
        &self,
        metadata: Metadata,
        target_dir: &Path,
        errors: &mut Vec<String>,
    ) -> Metadata {
        let options = self.effective_options();

        if !metadata.is_playlist() {
            return self
                .executor
                .download_one(&metadata, &options, target_dir, errors)
                .await;
        }

        let entries = metadata.entries();
        let selection = PlaylistSelection::from_options(&self.options);
        let indexes = resolve_indexes(entries.len(), &selection);
        tracing::info!(
            selected = indexes.len(),
            total = entries.len(),
            "downloading playlist entries"
        );

        let mut downloaded = Vec::with_capacity(indexes.len());
        for index in indexes {
            tracing::debug!(index, "playlist entry");
            let result = self
                .executor
                .download_one(&entries[index], &options, target_dir, errors)
                .await;
            downloaded.push(result);
        }

        let mut playlist = metadata;
        playlist.set_entries(downloaded);
        playlist
    }
}
