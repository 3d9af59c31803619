// Failure diagnostics - classifies extractor stderr output
//
// The extractor reports problems as free-form lines on stderr, usually
// prefixed with `WARNING:` or `ERROR:`. This module turns that text into:
// - a coarse failure reason attached to process errors
// - a list of diagnostic lines recorded in the caller's error list

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reasons an extractor invocation may fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// No extractor handles the link
    UnsupportedUrl,

    /// Item deleted, removed or otherwise unavailable
    Unavailable,

    /// Private item requiring authorization
    Private,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Geographic restriction
    GeoBlocked,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// HTTP 403 and other access denials
    Forbidden,

    /// Timeouts, refused connections, DNS failures
    Network,

    /// DRM-protected content, cannot be fetched at all
    DrmProtected,

    /// Anything else
    Unknown,
}

impl FailureReason {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedUrl => "unsupported URL",
            Self::Unavailable => "item unavailable",
            Self::Private => "private item",
            Self::AgeRestricted => "age-restricted content",
            Self::GeoBlocked => "geographic restriction",
            Self::RateLimited => "rate limited",
            Self::Forbidden => "access denied",
            Self::Network => "network failure",
            Self::DrmProtected => "DRM-protected content",
            Self::Unknown => "unknown failure",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Analyze stderr output and return the most specific failure reason
pub fn diagnose(stderr: &str) -> FailureReason {
    let lower = stderr.to_lowercase();

    // Check patterns in order of specificity

    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return FailureReason::UnsupportedUrl;
    }

    if lower.contains("drm")
        || lower.contains("widevine")
        || lower.contains("requires purchase")
        || lower.contains("rental")
    {
        return FailureReason::DrmProtected;
    }

    if lower.contains("private video")
        || lower.contains("is private")
        || lower.contains("sign in if you've been granted access")
    {
        return FailureReason::Private;
    }

    if lower.contains("age-restricted")
        || lower.contains("confirm your age")
        || lower.contains("age_verification")
    {
        return FailureReason::AgeRestricted;
    }

    if lower.contains("available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geo restricted")
        || lower.contains("geo-restricted")
    {
        return FailureReason::GeoBlocked;
    }

    if lower.contains("video unavailable")
        || lower.contains("has been removed")
        || lower.contains("no longer available")
        || lower.contains("is unavailable")
        || lower.contains("http error 404")
    {
        return FailureReason::Unavailable;
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return FailureReason::RateLimited;
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return FailureReason::Forbidden;
    }

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
        || lower.contains("name or service not known")
        || lower.contains("getaddrinfo failed")
    {
        return FailureReason::Network;
    }

    FailureReason::Unknown
}

/// Split stderr output into trimmed, non-empty diagnostic lines
pub fn diagnostic_lines(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a diagnostic line is a warning rather than an error
pub fn is_warning(line: &str) -> bool {
    line.trim_start().to_uppercase().starts_with("WARNING")
}
