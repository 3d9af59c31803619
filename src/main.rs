//! `ytdl` command line: extract metadata for a link (cached) and download
//! the selected entries.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ytdl_orchestrator::downloader::options::{
    FORMAT, PLAYLIST_END, PLAYLIST_ITEMS, PLAYLIST_RANDOM, PLAYLIST_REVERSE, PLAYLIST_START,
};
use ytdl_orchestrator::{ConfigError, Metadata, Outcome, Ytdl, YtdlConfig};

#[derive(Debug, Parser)]
#[command(name = "ytdl")]
#[command(about = "Cached metadata extraction and playlist downloads via an external extractor")]
#[command(version)]
struct Cli {
    /// Link of the item or playlist
    #[arg(required_unless_present = "extractor_version")]
    link: Option<String>,

    /// Directory downloads are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Only print extracted metadata, download nothing
    #[arg(long, default_value_t = false)]
    info_only: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extractor executable
    #[arg(long)]
    extractor: Option<PathBuf>,

    /// Format selector passed to the extractor
    #[arg(short, long)]
    format: Option<String>,

    /// First playlist item to download (1-based)
    #[arg(long)]
    playlist_start: Option<usize>,

    /// Last playlist item to download (1-based)
    #[arg(long)]
    playlist_end: Option<usize>,

    /// Playlist items, e.g. "1,3,5-7"; overrides start/end
    #[arg(long)]
    playlist_items: Option<String>,

    /// Download selected entries in reverse order
    #[arg(long, default_value_t = false)]
    playlist_reverse: bool,

    /// Download selected entries in random order
    #[arg(long, default_value_t = false)]
    playlist_random: bool,

    /// Bypass the metadata cache
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Metadata cache time-to-live in seconds
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Per-invocation timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Extra extractor option, `name` or `name=value` (repeatable)
    #[arg(long = "opt", value_name = "NAME[=VALUE]")]
    opts: Vec<String>,

    /// Print the extractor's version and exit
    #[arg(long, default_value_t = false)]
    extractor_version: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_config(cli: &Cli) -> Result<YtdlConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => YtdlConfig::load(path)?,
        None => YtdlConfig::default(),
    };

    if cli.extractor.is_some() {
        config = config.with_extractor_path(cli.extractor.clone());
    }
    if cli.no_cache {
        config = config.with_cache_enabled(false);
    }
    if let Some(ttl) = cli.cache_ttl {
        config = config.with_cache_ttl(ttl);
    }
    if let Some(timeout) = cli.timeout {
        config = config.with_timeout(timeout);
    }
    Ok(config)
}

fn apply_options(ytdl: &mut Ytdl, cli: &Cli) {
    let options = ytdl.options_mut();

    if let Some(format) = &cli.format {
        options.set(FORMAT, format.clone());
    }
    if let Some(start) = cli.playlist_start {
        options.set(PLAYLIST_START, start.to_string());
    }
    if let Some(end) = cli.playlist_end {
        options.set(PLAYLIST_END, end.to_string());
    }
    if let Some(items) = &cli.playlist_items {
        options.set(PLAYLIST_ITEMS, items.clone());
    }
    if cli.playlist_reverse {
        options.set_flag(PLAYLIST_REVERSE);
    }
    if cli.playlist_random {
        options.set_flag(PLAYLIST_RANDOM);
    }

    for raw in &cli.opts {
        match raw.split_once('=') {
            Some((name, value)) => options.set(name, value),
            None => options.set_flag(raw),
        };
    }
}

fn report<T>(outcome: &Outcome<T>) {
    for message in &outcome.errors {
        error!("{}", message);
    }
}

fn print_json(metadata: &Metadata) -> bool {
    match serde_json::to_string_pretty(metadata) {
        Ok(text) => {
            println!("{}", text);
            true
        }
        Err(e) => {
            error!("cannot render metadata: {}", e);
            false
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let mut ytdl = Ytdl::new(config);
    apply_options(&mut ytdl, &cli);

    if cli.extractor_version {
        return match ytdl.extractor_version().await {
            Ok(version) => {
                println!("{}", version);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let Some(link) = cli.link.as_deref() else {
        return ExitCode::from(2);
    };

    if cli.info_only {
        let outcome = ytdl.extract_infos(link).await;
        report(&outcome);
        if outcome.data.is_empty() {
            info!("no metadata found for {}", link);
            return if outcome.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE };
        }
        return if print_json(&outcome.data) { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    }

    match ytdl.run(link, &cli.output_dir).await {
        Ok(outcome) => {
            report(&outcome);
            match &outcome.data {
                Some(metadata) => {
                    print_json(metadata);
                }
                None => info!("nothing to download for {}", link),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
