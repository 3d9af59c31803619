// Downloader module - extraction, caching, selection and per-entry downloads

pub mod cache;
pub mod errors;
pub mod executor;
pub mod extractors;
pub mod models;
pub mod options;
pub mod sanitizer;
pub mod selection;
pub mod slug;
pub mod tools;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::MetadataCache;
pub use errors::ExtractError;
pub use executor::DownloadExecutor;
pub use extractors::{Extraction, ExtractorClient, FailureReason};
pub use models::{Metadata, Outcome};
pub use options::OptionStore;
pub use selection::{resolve_indexes, PlaylistSelection};
pub use traits::{ProcessOutput, ProcessRunner, Slugifier, StderrSink};
pub use utils::TokioProcessRunner;
