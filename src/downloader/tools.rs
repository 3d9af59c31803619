// Extractor discovery and version probing

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::ExtractError;
use super::traits::ProcessRunner;

/// Environment variable overriding extractor discovery
pub const EXTRACTOR_ENV: &str = "YTDL_EXTRACTOR";

const EXTRACTOR_BINARY: &str = "yt-dlp";
const VERSION_TIMEOUT: Duration = Duration::from_secs(15);

/// Find the extractor executable.
///
/// Order: explicit path, `YTDL_EXTRACTOR`, common install locations,
/// every `PATH` entry, then the bare binary name.
pub fn locate_extractor(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Some(custom) = std::env::var_os(EXTRACTOR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(custom);
    }

    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        let path = Path::new(path);
        if path.is_file() {
            return path.to_path_buf();
        }
    }

    if let Some(found) = search_path(EXTRACTOR_BINARY) {
        return found;
    }

    PathBuf::from(EXTRACTOR_BINARY)
}

fn search_path(binary: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .flat_map(|dir| candidates(&dir, binary))
        .find(|candidate| candidate.is_file())
}

fn candidates(dir: &Path, binary: &str) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![dir.join(format!("{}.exe", binary)), dir.join(binary)]
    } else {
        vec![dir.join(binary)]
    }
}

/// Ask the extractor for its version string.
pub async fn extractor_version(
    runner: &dyn ProcessRunner,
    program: &Path,
) -> Result<String, ExtractError> {
    let output = runner
        .run(program, &["--version".to_string()], VERSION_TIMEOUT, None)
        .await?;

    if !output.success {
        return Err(ExtractError::process_failed(output.code, &output.stderr_text()));
    }

    let version = output.stdout_text().trim().to_string();
    if version.is_empty() {
        return Err(ExtractError::Parse("empty version output".to_string()));
    }
    Ok(version)
}
