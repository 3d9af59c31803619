//! Orchestrates an external media-metadata extractor: caches extracted
//! metadata on disk, sanitizes playlists, resolves playlist selections and
//! downloads entries one child process at a time.

pub mod config;
pub mod downloader;
mod ytdl;

pub use config::{ConfigError, YtdlConfig};
pub use downloader::{ExtractError, Metadata, OptionStore, Outcome, PlaylistSelection};
pub use ytdl::Ytdl;
