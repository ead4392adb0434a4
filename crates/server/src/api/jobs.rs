//! Job API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use ytdl_core::{
    scheduler::DownloadsSnapshot, BatchOptions, DownloadsConfig, Job, JobId, JobKind, JobRequest,
};

use super::handlers::{api_error, scheduler_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting one job
#[derive(Debug, Deserialize)]
pub struct SubmitJobBody {
    /// Source URL, or input file path for `convert`
    pub url: String,
    pub kind: JobKind,
    /// Destination directory; defaults to the configured download directory
    pub output_path: Option<PathBuf>,
    pub quality: Option<String>,
    /// Target extension (`mp4`, `mp3`, ...)
    pub format: Option<String>,
    #[serde(default)]
    pub add_metadata: bool,
}

/// Request body for submitting many URLs with shared options
#[derive(Debug, Deserialize)]
pub struct SubmitBatchBody {
    pub urls: Vec<String>,
    pub kind: JobKind,
    pub output_path: Option<PathBuf>,
    pub quality: Option<String>,
    pub format: Option<String>,
    #[serde(default)]
    pub add_metadata: bool,
}

#[derive(Debug, Serialize)]
pub struct RejectedUrl {
    pub url: String,
    pub error: String,
}

/// Response for a batch submission
#[derive(Debug, Serialize)]
pub struct SubmitBatchResponse {
    pub submitted: Vec<JobId>,
    pub rejected: Vec<RejectedUrl>,
}

#[derive(Debug, Serialize)]
pub struct CancelJobResponse {
    pub job_id: JobId,
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearFinishedResponse {
    pub removed: usize,
}

fn default_quality(downloads: &DownloadsConfig, kind: JobKind) -> String {
    match kind {
        JobKind::Video => downloads.video_quality.clone(),
        JobKind::Audio => downloads.audio_quality.clone(),
        JobKind::Convert => "medium".to_string(),
    }
}

fn default_format(downloads: &DownloadsConfig, kind: JobKind) -> String {
    match kind {
        JobKind::Video | JobKind::Convert => downloads.video_format.clone(),
        JobKind::Audio => downloads.audio_format.clone(),
    }
}

impl SubmitJobBody {
    fn into_request(self, downloads: &DownloadsConfig) -> JobRequest {
        JobRequest {
            quality: self
                .quality
                .unwrap_or_else(|| default_quality(downloads, self.kind)),
            format_ext: self
                .format
                .unwrap_or_else(|| default_format(downloads, self.kind)),
            output_path: self
                .output_path
                .unwrap_or_else(|| downloads.directory.clone()),
            url: self.url,
            kind: self.kind,
            add_metadata: self.add_metadata,
        }
    }
}

impl SubmitBatchBody {
    fn options(&self, downloads: &DownloadsConfig) -> BatchOptions {
        BatchOptions {
            output_path: self
                .output_path
                .clone()
                .unwrap_or_else(|| downloads.directory.clone()),
            kind: self.kind,
            quality: Some(
                self.quality
                    .clone()
                    .unwrap_or_else(|| default_quality(downloads, self.kind)),
            ),
            format_ext: Some(
                self.format
                    .clone()
                    .unwrap_or_else(|| default_format(downloads, self.kind)),
            ),
            add_metadata: self.add_metadata,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a single job
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitJobBody>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    let request = body.into_request(state.downloads());
    let scheduler = state.scheduler();

    let id = scheduler.submit(request).await.map_err(scheduler_error)?;

    // The job may already have moved on, but it is never dropped
    match scheduler.job(&id).await {
        Some(job) => Ok((StatusCode::CREATED, Json(job))),
        None => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Job {} disappeared after submit", id),
        )),
    }
}

/// Submit one job per URL; invalid URLs are reported, not fatal
pub async fn submit_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitBatchBody>,
) -> Result<Json<SubmitBatchResponse>, ApiError> {
    if body.urls.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No URLs provided"));
    }

    let options = body.options(state.downloads());
    let results = state.scheduler().submit_batch(&body.urls, &options).await;

    let mut response = SubmitBatchResponse {
        submitted: Vec::new(),
        rejected: Vec::new(),
    };
    for (url, result) in body.urls.iter().zip(results) {
        match result {
            Ok(id) => response.submitted.push(id),
            Err(e) => response.rejected.push(RejectedUrl {
                url: url.clone(),
                error: e.to_string(),
            }),
        }
    }

    info!(
        submitted = response.submitted.len(),
        rejected = response.rejected.len(),
        "Batch request handled"
    );
    Ok(Json(response))
}

/// List every job grouped by partition
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<DownloadsSnapshot> {
    Json(state.scheduler().all_downloads().await)
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    state
        .scheduler()
        .job(&JobId::from(id.as_str()))
        .await
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Job not found: {}", id)))
}

/// Cancel a pending or running job
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CancelJobResponse>, ApiError> {
    let job_id = JobId::from(id);
    let scheduler = state.scheduler();

    if scheduler.remove_job(&job_id).await {
        return Ok(Json(CancelJobResponse {
            job_id,
            cancelled: true,
        }));
    }

    match scheduler.job(&job_id).await {
        Some(job) => Err(api_error(
            StatusCode::CONFLICT,
            format!("Cannot cancel job {}: already {}", job_id, job.status),
        )),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Job not found: {}", job_id),
        )),
    }
}

/// Drop completed, failed and cancelled jobs
pub async fn clear_finished(State(state): State<Arc<AppState>>) -> Json<ClearFinishedResponse> {
    Json(ClearFinishedResponse {
        removed: state.scheduler().clear_finished().await,
    })
}
