//! Types for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a fetch should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Video with audio, muxed into `format_ext`.
    Video,
    /// Audio extracted to `format_ext`.
    Audio,
}

/// A single download request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    /// Job this fetch belongs to; used for logging.
    pub job_id: String,
    /// Normalized source URL.
    pub url: String,
    /// Directory the file is written into.
    pub output_dir: PathBuf,
    pub kind: MediaKind,
    /// `best`, `audio only`, a height such as `720p`, or an audio bitrate for audio fetches.
    pub quality: String,
    /// Target extension (`mp4`, `mp3`, ...).
    pub format_ext: String,
    /// Embed metadata and thumbnail. Only honoured for audio.
    pub add_metadata: bool,
}

/// Progress report pushed by a fetcher while it runs.
///
/// Every field is optional: remote sources frequently omit totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchProgress {
    /// Fraction in `[0, 1]`, when the total size is known or estimated.
    pub fraction_complete: Option<f32>,
    pub bytes_done: Option<u64>,
    pub bytes_total: Option<u64>,
    pub bytes_per_second: Option<f64>,
    pub eta_seconds: Option<u64>,
    /// Output filename, once the fetcher knows it.
    pub resolved_filename: Option<String>,
}

/// Result of a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchSuccess {
    /// Final file on disk, when the fetcher could determine it.
    pub output_path: Option<PathBuf>,
    /// File name component of the output.
    pub filename: Option<String>,
    /// Wall time spent fetching.
    pub duration_ms: u64,
}

/// What a listed format carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// Video and audio in one stream.
    Muxed,
    VideoOnly,
    AudioOnly,
}

/// One format a source offers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDetails {
    pub format_id: String,
    pub ext: String,
    pub kind: FormatKind,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    /// Average bitrate in kbit/s, mostly reported for audio.
    pub bitrate_kbps: Option<f64>,
    pub filesize: Option<u64>,
}

/// Metadata about a remote item, read without downloading it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaDetails {
    pub title: String,
    pub uploader: String,
    pub duration_secs: Option<f64>,
    pub view_count: Option<u64>,
    pub thumbnail: Option<String>,
    /// `YYYYMMDD`, as the platform reports it.
    pub upload_date: Option<String>,
    /// Formats without a video or audio stream (storyboards) are left out.
    pub formats: Vec<FormatDetails>,
}

/// Subtitle download settings applied to video fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleOptions {
    /// Fetch uploaded subtitles.
    pub enabled: bool,
    /// Also fetch auto-generated subtitles.
    pub auto_generated: bool,
    /// Language codes, e.g. `["en"]`.
    pub languages: Vec<String>,
}

impl Default for SubtitleOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            auto_generated: false,
            languages: vec!["en".to_string()],
        }
    }
}
