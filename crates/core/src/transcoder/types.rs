//! Types for the transcoder module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Input containers the transcoder accepts.
pub const VIDEO_INPUT_FORMATS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "3gp", "m4v",
];
pub const AUDIO_INPUT_FORMATS: &[&str] = &["mp3", "wav", "flac", "m4a", "aac", "ogg", "wma"];

/// Encoding effort/quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    Low,
    Medium,
    High,
    Lossless,
}

impl QualityPreset {
    /// Parses a preset label, falling back to `Medium` for anything unknown.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "lossless" => Self::Lossless,
            _ => Self::Medium,
        }
    }

    /// x264 constant rate factor.
    pub fn crf(&self) -> u8 {
        match self {
            Self::Low => 28,
            Self::Medium => 23,
            Self::High => 18,
            Self::Lossless => 0,
        }
    }

    /// x264 speed preset.
    pub fn x264_preset(&self) -> &'static str {
        match self {
            Self::Low => "fast",
            Self::Medium => "medium",
            Self::High => "slow",
            Self::Lossless => "veryslow",
        }
    }

    /// MP3 bitrate in kbps.
    pub fn mp3_bitrate_kbps(&self) -> u32 {
        match self {
            Self::Low => 128,
            Self::Medium => 192,
            Self::High | Self::Lossless => 320,
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Lossless => "lossless",
        };
        f.write_str(label)
    }
}

/// Output format the transcoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    Mp4,
    Avi,
    Mkv,
    Mov,
    Webm,
    Ogv,
    Mp3,
    Wav,
    Flac,
    M4a,
    Aac,
    Ogg,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 12] = [
        Self::Mp4,
        Self::Avi,
        Self::Mkv,
        Self::Mov,
        Self::Webm,
        Self::Ogv,
        Self::Mp3,
        Self::Wav,
        Self::Flac,
        Self::M4a,
        Self::Aac,
        Self::Ogg,
    ];

    /// Parses a file extension (case-insensitive, leading dot allowed).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mkv => "mkv",
            Self::Mov => "mov",
            Self::Webm => "webm",
            Self::Ogv => "ogv",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::M4a => "m4a",
            Self::Aac => "aac",
            Self::Ogg => "ogg",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            Self::Mp3 | Self::Wav | Self::Flac | Self::M4a | Self::Aac | Self::Ogg
        )
    }

    /// Video and audio codecs used for video targets.
    pub fn video_codecs(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Mp4 | Self::Avi | Self::Mkv | Self::Mov => Some(("libx264", "aac")),
            Self::Webm => Some(("libvpx-vp9", "libopus")),
            Self::Ogv => Some(("libtheora", "libvorbis")),
            _ => None,
        }
    }

    /// Audio codec used for audio targets.
    pub fn audio_codec(&self) -> Option<&'static str> {
        match self {
            Self::Mp3 => Some("libmp3lame"),
            Self::Wav => Some("pcm_s16le"),
            Self::Flac => Some("flac"),
            Self::M4a | Self::Aac => Some("aac"),
            Self::Ogg => Some("libvorbis"),
            _ => None,
        }
    }
}

/// A single transcode request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscodeRequest {
    /// Job this conversion belongs to; used for logging.
    pub job_id: String,
    pub input_path: PathBuf,
    /// Directory the converted file is written into.
    pub output_dir: PathBuf,
    /// Target extension (`mp4`, `mp3`, ...).
    pub format_ext: String,
    /// Preset label: `low`, `medium`, `high` or `lossless`.
    pub quality: String,
}

/// Progress report pushed during a transcode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranscodeProgress {
    /// Fraction in `[0, 1]`; zero until the input duration is known.
    pub fraction_complete: f32,
    pub current_time_seconds: f64,
    pub total_time_seconds: Option<f64>,
}

/// Result of a completed transcode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscodeSuccess {
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
    pub input_format: String,
    pub output_format: String,
}

/// Media file information from ffprobe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    /// File path.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format (e.g., "mp4", "matroska").
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }
}
