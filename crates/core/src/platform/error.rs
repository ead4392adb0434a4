//! Error types for the platform module.

use thiserror::Error;

/// Errors returned when a URL cannot be routed to a platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Input was empty or whitespace only.
    #[error("URL cannot be empty")]
    EmptyUrl,

    /// Input could not be parsed into a URL with a host.
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    /// No registered platform (including the fallback) accepts the URL.
    #[error("Platform not supported. Supported platforms: {}", supported.join(", "))]
    UnsupportedPlatform { supported: Vec<String> },

    /// A platform definition carried a pattern that does not compile.
    #[error("Invalid platform pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_lists_platforms() {
        let err = ResolveError::UnsupportedPlatform {
            supported: vec!["YouTube".to_string(), "Vimeo".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Platform not supported. Supported platforms: YouTube, Vimeo"
        );
    }

    #[test]
    fn test_empty_url_display() {
        assert_eq!(ResolveError::EmptyUrl.to_string(), "URL cannot be empty");
    }
}
