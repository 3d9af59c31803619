// Error types for extractor invocations

use thiserror::Error;

use super::extractors::diagnostics::FailureReason;

#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// Extractor executable could not be found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Process could not be started or its pipes could not be read
    #[error("Failed to run extractor: {0}")]
    Spawn(String),

    /// Process exceeded the configured run time and was killed
    #[error("Extractor timed out after {0}s")]
    Timeout(u64),

    /// Process exited without producing usable output
    #[error("Extractor failed ({reason}, exit code {}): {message}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ProcessFailed {
        code: Option<i32>,
        reason: FailureReason,
        message: String,
    },

    /// Output was not a JSON metadata record
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ExtractError {
    /// Build a `ProcessFailed` from a non-zero exit, diagnosing stderr.
    pub fn process_failed(code: Option<i32>, stderr: &str) -> Self {
        let message = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .unwrap_or("no diagnostic output")
            .to_string();

        Self::ProcessFailed {
            code,
            reason: super::extractors::diagnostics::diagnose(stderr),
            message,
        }
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::ToolNotFound(e.to_string()),
            _ => Self::Spawn(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(format!("Invalid JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failed_keeps_last_line() {
        let err = ExtractError::process_failed(
            Some(1),
            "WARNING: falling back\nERROR: Unsupported URL: https://example.com\n",
        );
        match &err {
            ExtractError::ProcessFailed { code, reason, message } => {
                assert_eq!(*code, Some(1));
                assert_eq!(*reason, FailureReason::UnsupportedUrl);
                assert_eq!(message, "ERROR: Unsupported URL: https://example.com");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
        assert!(err.to_string().contains("exit code 1"));
    }

    #[test]
    fn test_io_not_found_maps_to_tool_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        assert!(matches!(ExtractError::from(io), ExtractError::ToolNotFound(_)));
    }
}
