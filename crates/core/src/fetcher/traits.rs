//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::FetchError;
use super::types::{FetchProgress, FetchRequest, FetchSuccess, MediaDetails};
use crate::outcome::Outcome;

/// Downloads media from a remote URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Fetches `request.url` into `request.output_dir`.
    ///
    /// Progress is pushed to `progress_tx`; a dropped receiver does not stop
    /// the fetch. Implementations check `cancel` at every progress tick and
    /// return `Outcome::Cancelled` once it fires.
    async fn fetch(
        &self,
        request: FetchRequest,
        progress_tx: mpsc::Sender<FetchProgress>,
        cancel: CancellationToken,
    ) -> Result<Outcome<FetchSuccess>, FetchError>;

    /// Reads title, duration and available formats without downloading.
    async fn info(&self, url: &str) -> Result<MediaDetails, FetchError>;

    /// Validates that the fetcher is properly configured and ready.
    async fn validate(&self) -> Result<(), FetchError>;
}
