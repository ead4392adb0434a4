//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the yt-dlp and ffmpeg subprocesses so the
//! scheduler and the HTTP API can be exercised without either binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use ytdl_core::testing::{fixtures, MockFetcher, MockTranscoder};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.fail_url("broken", "Video unavailable").await;
//!
//! let scheduler = fixtures::scheduler(&fetcher, &MockTranscoder::new(), 2);
//! scheduler.start().await;
//! ```

mod mock_fetcher;
mod mock_transcoder;

pub use mock_fetcher::MockFetcher;
pub use mock_transcoder::MockTranscoder;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{MockFetcher, MockTranscoder};
    use crate::platform::PlatformRegistry;
    use crate::scheduler::{BatchScheduler, SchedulerConfig};

    /// Scheduler config with a short poll interval and shutdown timeout.
    pub fn scheduler_config(concurrency: usize) -> SchedulerConfig {
        SchedulerConfig::default()
            .with_concurrency(concurrency)
            .with_poll_interval(Duration::from_millis(10))
            .with_shutdown_timeout(Duration::from_secs(2))
    }

    /// A stopped scheduler wired to the built-in registry and the given mocks.
    pub fn scheduler(
        fetcher: &MockFetcher,
        transcoder: &MockTranscoder,
        concurrency: usize,
    ) -> BatchScheduler {
        BatchScheduler::new(
            scheduler_config(concurrency),
            Arc::new(PlatformRegistry::builtin()),
            Arc::new(fetcher.clone()),
            Arc::new(transcoder.clone()),
        )
    }

    /// `count` distinct SoundCloud track URLs.
    pub fn audio_urls(count: usize) -> Vec<String> {
        (1..=count)
            .map(|i| format!("https://soundcloud.com/artist/track-{}", i))
            .collect()
    }

    /// `count` distinct Vimeo video URLs.
    pub fn video_urls(count: usize) -> Vec<String> {
        (1..=count)
            .map(|i| format!("https://vimeo.com/{}", 100 + i))
            .collect()
    }
}
