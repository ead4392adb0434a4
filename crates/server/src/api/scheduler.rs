//! Scheduler control API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use ytdl_core::QueueStatus;

use super::handlers::{api_error, scheduler_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetConcurrencyBody {
    pub concurrency: usize,
}

/// Current queue counts and pool state
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    Json(state.scheduler().queue_status().await)
}

/// Start the worker pool. Starting a started pool is a no-op.
pub async fn start(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    let scheduler = state.scheduler();
    scheduler.start().await;
    Json(scheduler.queue_status().await)
}

/// Stop the pool, cancelling running and pending jobs.
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    let scheduler = state.scheduler();
    info!("Stop requested over API");
    scheduler.stop().await;
    Json(scheduler.queue_status().await)
}

pub async fn pause(State(state): State<Arc<AppState>>) -> Result<Json<QueueStatus>, ApiError> {
    let scheduler = state.scheduler();
    if !scheduler.pause().await {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Scheduler is not running",
        ));
    }
    Ok(Json(scheduler.queue_status().await))
}

pub async fn resume(State(state): State<Arc<AppState>>) -> Result<Json<QueueStatus>, ApiError> {
    let scheduler = state.scheduler();
    if !scheduler.resume().await {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Nothing to resume",
        ));
    }
    Ok(Json(scheduler.queue_status().await))
}

/// Change the worker count; only allowed while stopped
pub async fn set_concurrency(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetConcurrencyBody>,
) -> Result<Json<QueueStatus>, ApiError> {
    let scheduler = state.scheduler();
    scheduler
        .set_concurrency(body.concurrency)
        .await
        .map_err(scheduler_error)?;
    Ok(Json(scheduler.queue_status().await))
}
