//! Types for the batch scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::fetcher::MediaKind;

/// Process-wide sequence so ids minted in the same millisecond stay distinct.
static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique job identifier: `{kind}_{unix_millis}_{seq}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Mints a fresh id for a job of `kind`.
    pub fn generate(kind: JobKind) -> Self {
        let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{}_{}_{}",
            kind.as_str(),
            Utc::now().timestamp_millis(),
            seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Download video.
    Video,
    /// Download and extract audio.
    Audio,
    /// Convert a local file.
    Convert,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Convert => "convert",
        }
    }

    /// Download kinds go through the platform resolver and the fetcher.
    pub fn is_download(&self) -> bool {
        self.media_kind().is_some()
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Video => Some(MediaKind::Video),
            Self::Audio => Some(MediaKind::Audio),
            Self::Convert => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (*self, next) {
            (Pending, Running) | (Pending, Cancelled) => true,
            (Running, Completed) | (Running, Failed) | (Running, Cancelled) => true,
            (Pending, Pending) | (Pending, Completed) | (Pending, Failed) => false,
            (Running, Pending) | (Running, Running) => false,
            (Completed, _) | (Failed, _) | (Cancelled, _) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: JobId,
    /// Source URL for downloads, input file path for conversions.
    pub url: String,
    /// Destination directory.
    pub output_path: PathBuf,
    pub kind: JobKind,
    pub quality: String,
    pub format_ext: String,
    pub add_metadata: bool,
    /// Resolved platform name for downloads.
    pub platform: Option<String>,
    pub status: JobStatus,
    /// Fraction in `[0, 1]`.
    pub progress: f32,
    pub error_message: Option<String>,
    pub filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Creates a pending job from a request.
    pub fn new(request: JobRequest, platform: Option<String>) -> Self {
        Self {
            id: JobId::generate(request.kind),
            url: request.url,
            output_path: request.output_path,
            kind: request.kind,
            quality: request.quality,
            format_ext: request.format_ext,
            add_metadata: request.add_metadata && request.kind == JobKind::Audio,
            platform,
            status: JobStatus::Pending,
            progress: 0.0,
            error_message: None,
            filename: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Applies a status transition and stamps the matching timestamp.
    ///
    /// Returns `false` and leaves the job untouched if the transition is illegal.
    pub fn transition(&mut self, next: JobStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        match next {
            JobStatus::Running => self.started_at = Some(Utc::now()),
            JobStatus::Completed => {
                self.progress = 1.0;
                self.finished_at = Some(Utc::now());
            }
            JobStatus::Failed | JobStatus::Cancelled => self.finished_at = Some(Utc::now()),
            JobStatus::Pending => {}
        }
        true
    }

    /// Marks the job failed with a message.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.transition(JobStatus::Failed) {
            self.error_message = Some(message.into());
            true
        } else {
            false
        }
    }

    /// Raises progress; lower values and updates outside `Running` are ignored.
    pub fn advance_progress(&mut self, fraction: f32) -> bool {
        if self.status != JobStatus::Running || !fraction.is_finite() {
            return false;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction <= self.progress {
            return false;
        }
        self.progress = fraction;
        true
    }
}

/// Parameters for a new job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub url: String,
    pub output_path: PathBuf,
    pub kind: JobKind,
    pub quality: String,
    pub format_ext: String,
    #[serde(default)]
    pub add_metadata: bool,
}

impl JobRequest {
    /// Video download with `best` quality into an mp4.
    pub fn video(url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_path: output_path.into(),
            kind: JobKind::Video,
            quality: "best".to_string(),
            format_ext: "mp4".to_string(),
            add_metadata: false,
        }
    }

    /// Audio download at 192 kbps into an mp3.
    pub fn audio(url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_path: output_path.into(),
            kind: JobKind::Audio,
            quality: "192".to_string(),
            format_ext: "mp3".to_string(),
            add_metadata: false,
        }
    }

    /// Conversion of a local file at the `medium` preset.
    pub fn convert(
        input_path: impl Into<String>,
        output_path: impl Into<PathBuf>,
        format_ext: impl Into<String>,
    ) -> Self {
        Self {
            url: input_path.into(),
            output_path: output_path.into(),
            kind: JobKind::Convert,
            quality: "medium".to_string(),
            format_ext: format_ext.into(),
            add_metadata: false,
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn with_format(mut self, format_ext: impl Into<String>) -> Self {
        self.format_ext = format_ext.into();
        self
    }

    pub fn with_metadata(mut self, add_metadata: bool) -> Self {
        self.add_metadata = add_metadata;
        self
    }
}

/// Options shared by every URL of a batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    pub output_path: PathBuf,
    pub kind: JobKind,
    pub quality: Option<String>,
    pub format_ext: Option<String>,
    #[serde(default)]
    pub add_metadata: bool,
}

impl BatchOptions {
    pub fn new(kind: JobKind, output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            kind,
            quality: None,
            format_ext: None,
            add_metadata: false,
        }
    }

    /// Builds the request for one URL of the batch.
    pub fn request_for(&self, url: &str) -> JobRequest {
        let base = match self.kind {
            JobKind::Video => JobRequest::video(url, self.output_path.clone()),
            JobKind::Audio => JobRequest::audio(url, self.output_path.clone()),
            JobKind::Convert => JobRequest::convert(
                url,
                self.output_path.clone(),
                self.format_ext.clone().unwrap_or_else(|| "mp4".to_string()),
            ),
        };
        let base = match &self.quality {
            Some(q) => base.with_quality(q.clone()),
            None => base,
        };
        let base = match &self.format_ext {
            Some(f) => base.with_format(f.clone()),
            None => base,
        };
        base.with_metadata(self.add_metadata)
    }
}

/// Worker pool lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    Stopped,
    Running,
    Paused,
}

/// Aggregated counts, computed under one lock so they are mutually consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub pending: usize,
    pub active: usize,
    pub completed: usize,
    /// Failed and cancelled jobs.
    pub failed: usize,
    /// Subset of `failed` whose status is `Cancelled`.
    pub cancelled: usize,
    pub state: PoolState,
    pub running: bool,
    pub concurrency: usize,
}

impl QueueStatus {
    pub fn total(&self) -> usize {
        self.pending + self.active + self.completed + self.failed
    }
}

/// Owned copies of every job, grouped by partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DownloadsSnapshot {
    pub pending: Vec<Job>,
    pub active: Vec<Job>,
    pub completed: Vec<Job>,
    pub failed: Vec<Job>,
}

impl DownloadsSnapshot {
    /// Iterates every job across all partitions.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.pending
            .iter()
            .chain(&self.active)
            .chain(&self.completed)
            .chain(&self.failed)
    }
}

/// Notification broadcast to scheduler observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    JobAdded {
        job_id: JobId,
        kind: JobKind,
        url: String,
    },
    BatchStarted {
        concurrency: usize,
    },
    BatchPaused,
    BatchResumed,
    BatchStopped {
        /// Jobs cancelled by the stop.
        cancelled: usize,
    },
    DownloadStarted {
        job_id: JobId,
        worker: usize,
    },
    JobProgress {
        job_id: JobId,
        progress: f32,
        filename: Option<String>,
    },
    DownloadCompleted {
        job_id: JobId,
        status: JobStatus,
        error_message: Option<String>,
        filename: Option<String>,
    },
    JobCancelled {
        job_id: JobId,
    },
}

impl SchedulerEvent {
    /// Job this event concerns, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::JobAdded { job_id, .. }
            | Self::DownloadStarted { job_id, .. }
            | Self::JobProgress { job_id, .. }
            | Self::DownloadCompleted { job_id, .. }
            | Self::JobCancelled { job_id } => Some(job_id),
            Self::BatchStarted { .. }
            | Self::BatchPaused
            | Self::BatchResumed
            | Self::BatchStopped { .. } => None,
        }
    }
}
