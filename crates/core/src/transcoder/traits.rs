//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::TranscodeError;
use super::types::{
    MediaInfo, TranscodeProgress, TranscodeRequest, TranscodeSuccess, AUDIO_INPUT_FORMATS,
    VIDEO_INPUT_FORMATS,
};
use crate::outcome::Outcome;

/// Converts local media files between containers and codecs.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError>;

    /// Converts `request.input_path` into `request.output_dir`.
    ///
    /// Progress is pushed to `progress_tx`; if the receiver is dropped the
    /// conversion continues without progress reporting. Returns
    /// `Outcome::Cancelled` once `cancel` fires.
    async fn transcode(
        &self,
        request: TranscodeRequest,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<Outcome<TranscodeSuccess>, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;

    /// Returns the supported input formats.
    fn supported_input_formats(&self) -> Vec<&'static str> {
        VIDEO_INPUT_FORMATS
            .iter()
            .chain(AUDIO_INPUT_FORMATS)
            .copied()
            .collect()
    }
}
