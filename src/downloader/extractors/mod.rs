// Extractor module - metadata dumps and failure diagnostics
//
// - `cli`: runs the extractor binary in single-JSON dump mode
// - `diagnostics`: classifies stderr output into failure reasons

mod cli;
pub mod diagnostics;

pub use cli::{parse_json_output, Extraction, ExtractorClient};
pub use diagnostics::{diagnose, FailureReason};
