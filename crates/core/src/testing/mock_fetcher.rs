//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::fetcher::{
    FetchError, FetchProgress, FetchRequest, FetchSuccess, Fetcher, FormatDetails, FormatKind,
    MediaDetails,
};
use crate::outcome::Outcome;

/// Mock implementation of the Fetcher trait.
///
/// Provides controllable behavior for testing:
/// - Record every request for assertions
/// - Fail or panic for chosen URLs
/// - Ignore cancellation for chosen URLs, like a hung subprocess
/// - Control how long a fetch takes, in progress ticks
/// - Track how many fetches run at once
///
/// # Example
///
/// ```rust,ignore
/// use ytdl_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new();
/// fetcher.set_timing(4, Duration::from_millis(20)).await;
/// fetcher.fail_url("soundcloud.com/artist/broken", "HTTP Error 404").await;
///
/// // Hand Arc::new(fetcher.clone()) to a BatchScheduler...
/// assert_eq!(fetcher.max_in_flight(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockFetcher {
    /// Recorded requests.
    requests: Arc<RwLock<Vec<FetchRequest>>>,
    /// URL substring -> failure message.
    failures: Arc<RwLock<HashMap<String, String>>>,
    /// URL substrings that make the fetch panic.
    panics: Arc<RwLock<HashSet<String>>>,
    /// URL substrings whose fetch never looks at its cancellation token.
    ignore_cancel: Arc<RwLock<HashSet<String>>>,
    /// Number of progress ticks per fetch.
    ticks: Arc<RwLock<u32>>,
    /// Sleep between ticks.
    tick_interval: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher: 4 ticks of 10ms each.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            panics: Arc::new(RwLock::new(HashSet::new())),
            ignore_cancel: Arc::new(RwLock::new(HashSet::new())),
            ticks: Arc::new(RwLock::new(4)),
            tick_interval: Arc::new(RwLock::new(Duration::from_millis(10))),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set how many progress ticks a fetch takes and how long each lasts.
    pub async fn set_timing(&self, ticks: u32, tick_interval: Duration) {
        *self.ticks.write().await = ticks;
        *self.tick_interval.write().await = tick_interval;
    }

    /// Make fetches whose URL contains `pattern` fail with `message`.
    pub async fn fail_url(&self, pattern: impl Into<String>, message: impl Into<String>) {
        self.failures
            .write()
            .await
            .insert(pattern.into(), message.into());
    }

    /// Make fetches whose URL contains `pattern` panic.
    pub async fn panic_on_url(&self, pattern: impl Into<String>) {
        self.panics.write().await.insert(pattern.into());
    }

    /// Make fetches whose URL contains `pattern` run to completion even
    /// when cancelled.
    pub async fn ignore_cancel_url(&self, pattern: impl Into<String>) {
        self.ignore_cancel.write().await.insert(pattern.into());
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<FetchRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of fetches started.
    pub async fn fetch_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Fetches running right now.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that ever ran at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn failure_for(&self, url: &str) -> Option<String> {
        self.failures
            .read()
            .await
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, message)| message.clone())
    }

    async fn panics_for(&self, url: &str) -> bool {
        self.panics
            .read()
            .await
            .iter()
            .any(|pattern| url.contains(pattern.as_str()))
    }

    async fn ignores_cancel(&self, url: &str) -> bool {
        self.ignore_cancel
            .read()
            .await
            .iter()
            .any(|pattern| url.contains(pattern.as_str()))
    }

    fn filename_for(request: &FetchRequest) -> String {
        let stem = request
            .url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("media");
        format!("{}.{}", stem, request.format_ext)
    }
}

/// Decrements the in-flight counter when a fetch ends, however it ends.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        request: FetchRequest,
        progress_tx: mpsc::Sender<FetchProgress>,
        cancel: CancellationToken,
    ) -> Result<Outcome<FetchSuccess>, FetchError> {
        let started = Instant::now();
        self.requests.write().await.push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(self.in_flight.clone());

        if self.panics_for(&request.url).await {
            panic!("mock fetcher exploded on {}", request.url);
        }
        if let Some(message) = self.failure_for(&request.url).await {
            return Err(FetchError::process_failed(
                "yt-dlp exited with status 1",
                Some(format!("ERROR: {}", message)),
            ));
        }

        let ticks = *self.ticks.read().await;
        let tick_interval = *self.tick_interval.read().await;
        let filename = Self::filename_for(&request);
        let stubborn = self.ignores_cancel(&request.url).await;

        for tick in 1..=ticks {
            if stubborn {
                tokio::time::sleep(tick_interval).await;
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
                    _ = tokio::time::sleep(tick_interval) => {}
                }
            }
            let _ = progress_tx.try_send(FetchProgress {
                fraction_complete: Some(tick as f32 / ticks as f32),
                bytes_done: Some(tick as u64 * 1024),
                bytes_total: Some(ticks as u64 * 1024),
                resolved_filename: Some(filename.clone()),
                ..Default::default()
            });
        }

        if cancel.is_cancelled() && !stubborn {
            return Ok(Outcome::Cancelled);
        }

        Ok(Outcome::Finished(FetchSuccess {
            output_path: Some(request.output_dir.join(&filename)),
            filename: Some(filename),
            duration_ms: started.elapsed().as_millis() as u64,
        }))
    }

    async fn info(&self, url: &str) -> Result<MediaDetails, FetchError> {
        if let Some(message) = self.failure_for(url).await {
            return Err(FetchError::process_failed(
                "yt-dlp exited with status 1",
                Some(format!("ERROR: {}", message)),
            ));
        }

        let title = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("media")
            .to_string();

        Ok(MediaDetails {
            title,
            uploader: "Mock Uploader".to_string(),
            duration_secs: Some(180.0),
            view_count: Some(42),
            thumbnail: None,
            upload_date: Some("20240101".to_string()),
            formats: vec![
                FormatDetails {
                    format_id: "18".to_string(),
                    ext: "mp4".to_string(),
                    kind: FormatKind::Muxed,
                    height: Some(360),
                    fps: Some(30.0),
                    bitrate_kbps: None,
                    filesize: None,
                },
                FormatDetails {
                    format_id: "140".to_string(),
                    ext: "m4a".to_string(),
                    kind: FormatKind::AudioOnly,
                    height: None,
                    fps: None,
                    bitrate_kbps: Some(128.0),
                    filesize: None,
                },
            ],
        })
    }

    async fn validate(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
