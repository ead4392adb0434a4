//! Configuration for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp based fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Timeout for a single download in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Additional yt-dlp arguments, inserted before the URL.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout() -> u64 {
    7200 // 2 hours
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            timeout_secs: default_timeout(),
            extra_args: Vec::new(),
        }
    }
}

impl FetcherConfig {
    pub fn with_path(ytdlp_path: PathBuf) -> Self {
        Self {
            ytdlp_path,
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.timeout_secs, 7200);
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_partial_toml() {
        let config: FetcherConfig = toml::from_str("timeout_secs = 60").unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
    }
}
