//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::outcome::Outcome;
use crate::transcoder::{
    MediaInfo, TargetFormat, TranscodeError, TranscodeProgress, TranscodeRequest,
    TranscodeSuccess, Transcoder,
};

/// Mock implementation of the Transcoder trait.
///
/// Records requests, can be told to fail for chosen inputs, and reports
/// progress over a configurable number of ticks. Never touches the
/// filesystem.
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    requests: Arc<RwLock<Vec<TranscodeRequest>>>,
    /// Input path substring -> failure message.
    failures: Arc<RwLock<HashMap<String, String>>>,
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    ticks: Arc<RwLock<u32>>,
    tick_interval: Arc<RwLock<Duration>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            ticks: Arc::new(RwLock::new(4)),
            tick_interval: Arc::new(RwLock::new(Duration::from_millis(10))),
        }
    }

    pub async fn set_timing(&self, ticks: u32, tick_interval: Duration) {
        *self.ticks.write().await = ticks;
        *self.tick_interval.write().await = tick_interval;
    }

    /// Make transcodes whose input path contains `pattern` fail.
    pub async fn fail_input(&self, pattern: impl Into<String>, message: impl Into<String>) {
        self.failures
            .write()
            .await
            .insert(pattern.into(), message.into());
    }

    pub async fn set_probe_result(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), info);
    }

    pub async fn recorded_requests(&self) -> Vec<TranscodeRequest> {
        self.requests.read().await.clone()
    }

    async fn failure_for(&self, input: &Path) -> Option<String> {
        let input = input.to_string_lossy();
        self.failures
            .read()
            .await
            .iter()
            .find(|(pattern, _)| input.contains(pattern.as_str()))
            .map(|(_, message)| message.clone())
    }

    fn default_info(path: &Path) -> MediaInfo {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_lowercase();
        let is_video = TargetFormat::from_extension(&format).is_some_and(|f| !f.is_audio());

        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 10 * 1024 * 1024,
            duration_secs: if is_video { 600.0 } else { 180.0 },
            format,
            audio_codec: Some("aac".to_string()),
            video_codec: is_video.then(|| "h264".to_string()),
            video_width: is_video.then_some(1280),
            video_height: is_video.then_some(720),
        }
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError> {
        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }
        Ok(Self::default_info(path))
    }

    async fn transcode(
        &self,
        request: TranscodeRequest,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<Outcome<TranscodeSuccess>, TranscodeError> {
        let started = Instant::now();
        self.requests.write().await.push(request.clone());

        let Some(target) = TargetFormat::from_extension(&request.format_ext) else {
            return Err(TranscodeError::UnsupportedOutputFormat {
                format: request.format_ext.clone(),
            });
        };
        if let Some(message) = self.failure_for(&request.input_path).await {
            return Err(TranscodeError::conversion_failed(
                "FFmpeg exited with code: Some(1)",
                Some(format!("{}: {}", request.input_path.display(), message)),
            ));
        }

        let ticks = *self.ticks.read().await;
        let tick_interval = *self.tick_interval.read().await;
        let total = 10.0 * ticks as f64;

        for tick in 1..=ticks {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
                _ = tokio::time::sleep(tick_interval) => {}
            }
            let _ = progress_tx.try_send(TranscodeProgress {
                fraction_complete: tick as f32 / ticks as f32,
                current_time_seconds: 10.0 * tick as f64,
                total_time_seconds: Some(total),
            });
        }

        let stem = request
            .input_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let input_format = request
            .input_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Outcome::Finished(TranscodeSuccess {
            output_path: request
                .output_dir
                .join(format!("{}.{}", stem, target.extension())),
            output_size_bytes: 5 * 1024 * 1024,
            duration_ms: started.elapsed().as_millis() as u64,
            input_format,
            output_format: target.extension().to_string(),
        }))
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
