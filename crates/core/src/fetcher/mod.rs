//! Fetcher module for downloading media from remote platforms.
//!
//! This module provides the `Fetcher` trait and a `YtDlpFetcher` that drives
//! the `yt-dlp` command-line tool as a subprocess.
//!
//! # Example
//!
//! ```ignore
//! use ytdl_core::fetcher::{Fetcher, FetchRequest, MediaKind, YtDlpFetcher};
//!
//! let fetcher = YtDlpFetcher::with_defaults();
//! fetcher.validate().await?;
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(32);
//! let cancel = CancellationToken::new();
//! let request = FetchRequest {
//!     job_id: "video_1".to_string(),
//!     url: "https://vimeo.com/123".to_string(),
//!     output_dir: PathBuf::from("/downloads"),
//!     kind: MediaKind::Video,
//!     quality: "720p".to_string(),
//!     format_ext: "mp4".to_string(),
//!     add_metadata: false,
//! };
//! let outcome = fetcher.fetch(request, tx, cancel).await?;
//! ```

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use traits::Fetcher;
pub use types::{
    FetchProgress, FetchRequest, FetchSuccess, FormatDetails, FormatKind, MediaDetails, MediaKind,
    SubtitleOptions,
};
pub use ytdlp::YtDlpFetcher;
