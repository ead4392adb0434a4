//! Transcoder module for converting local media files.
//!
//! This module provides the `Transcoder` trait and an FFmpeg implementation
//! that converts between the common video containers and audio formats.
//!
//! # Features
//!
//! - Video targets: MP4, AVI, MKV, MOV (H.264/AAC), WebM (VP9/Opus), OGV
//! - Audio targets: MP3, WAV, FLAC, M4A, AAC, OGG
//! - Quality presets (`low`, `medium`, `high`, `lossless`)
//! - Progress reporting and cooperative cancellation

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{
    MediaInfo, QualityPreset, TargetFormat, TranscodeProgress, TranscodeRequest,
    TranscodeSuccess, AUDIO_INPUT_FORMATS, VIDEO_INPUT_FORMATS,
};
