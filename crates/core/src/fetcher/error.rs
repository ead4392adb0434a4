//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching media.
#[derive(Debug, Error)]
pub enum FetchError {
    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The request cannot be executed as given.
    #[error("Invalid fetch request: {reason}")]
    InvalidRequest { reason: String },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// The download process exited unsuccessfully.
    #[error("Download failed: {reason}")]
    ProcessFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Download timed out.
    #[error("Download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while talking to the download process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Creates a process failure carrying captured stderr.
    pub fn process_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Message recorded on a failed job. Includes the last stderr line when
    /// the process left one.
    pub fn job_message(&self) -> String {
        match self {
            Self::ProcessFailed {
                reason,
                stderr: Some(stderr),
            } => match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                Some(last) => format!("Download failed: {}: {}", reason, last.trim()),
                None => self.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_message_uses_last_stderr_line() {
        let err = FetchError::process_failed(
            "yt-dlp exited with code: Some(1)",
            Some("WARNING: foo\nERROR: Video unavailable\n\n".to_string()),
        );
        assert_eq!(
            err.job_message(),
            "Download failed: yt-dlp exited with code: Some(1): ERROR: Video unavailable"
        );

        let bare = FetchError::process_failed("boom", None);
        assert_eq!(bare.job_message(), "Download failed: boom");
    }
}
