//! Worker loop.
//!
//! Each worker claims the queue head, runs it through the fetcher or the
//! transcoder, and files the result. Workers park while the pool is paused
//! and exit once it is stopped.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::ledger::JobResult;
use super::types::{Job, JobId, JobStatus, PoolState, SchedulerEvent};
use super::Shared;
use crate::fetcher::{FetchProgress, FetchRequest};
use crate::outcome::Outcome;
use crate::transcoder::{TranscodeProgress, TranscodeRequest};

/// Buffered progress messages per job.
const PROGRESS_BUFFER: usize = 32;

/// Progress fields the ledger records: fraction and resolved filename.
type ProgressUpdate = (Option<f32>, Option<String>);

pub(super) async fn run(shared: Arc<Shared>, worker: usize) {
    debug!(worker, "Worker started");

    loop {
        let claimed = {
            let mut ledger = shared.ledger.lock().await;
            match ledger.state {
                PoolState::Stopped => break,
                PoolState::Paused => None,
                PoolState::Running => ledger.claim_next().inspect(|(job, _)| {
                    shared.emit(SchedulerEvent::DownloadStarted {
                        job_id: job.id.clone(),
                        worker,
                    });
                }),
            }
        };

        match claimed {
            Some((job, cancel)) => process(&shared, worker, job, cancel).await,
            None => {
                let _ = timeout(shared.config.poll_interval(), shared.wake.notified()).await;
            }
        }
    }

    debug!(worker, "Worker stopped");
}

/// Runs one claimed job to a terminal state and files it.
async fn process(shared: &Shared, worker: usize, job: Job, cancel: CancellationToken) {
    info!(job_id = %job.id, worker, kind = %job.kind, url = %job.url, "Job started");

    let result = AssertUnwindSafe(execute(shared, &job, cancel))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            error!(job_id = %job.id, worker, "Job panicked: {}", message);
            JobResult::Failed(format!("Worker panicked: {}", message))
        });

    let mut ledger = shared.ledger.lock().await;
    let Some(filed) = ledger.finish(&job.id, result) else {
        warn!(job_id = %job.id, "Finished job was no longer active");
        return;
    };

    match filed.status {
        JobStatus::Completed => info!(job_id = %filed.id, worker, "Job completed"),
        JobStatus::Cancelled => info!(job_id = %filed.id, worker, "Job cancelled"),
        _ => warn!(
            job_id = %filed.id,
            worker,
            error = filed.error_message.as_deref().unwrap_or(""),
            "Job failed"
        ),
    }

    shared.emit(SchedulerEvent::DownloadCompleted {
        job_id: filed.id,
        status: filed.status,
        error_message: filed.error_message,
        filename: filed.filename,
    });
}

/// Dispatches a job by kind.
async fn execute(shared: &Shared, job: &Job, cancel: CancellationToken) -> JobResult {
    match job.kind.media_kind() {
        Some(kind) => {
            let request = FetchRequest {
                job_id: job.id.to_string(),
                url: job.url.clone(),
                output_dir: job.output_path.clone(),
                kind,
                quality: job.quality.clone(),
                format_ext: job.format_ext.clone(),
                add_metadata: job.add_metadata,
            };
            let (tx, rx) = mpsc::channel(PROGRESS_BUFFER);
            let work = shared.fetcher.fetch(request, tx, cancel);

            match drive(shared, &job.id, work, rx, fetch_update).await {
                Ok(Outcome::Finished(success)) => JobResult::Completed {
                    filename: success.filename,
                },
                Ok(Outcome::Cancelled) => JobResult::Cancelled,
                Err(e) => JobResult::Failed(e.job_message()),
            }
        }
        None => {
            let request = TranscodeRequest {
                job_id: job.id.to_string(),
                input_path: job.url.clone().into(),
                output_dir: job.output_path.clone(),
                format_ext: job.format_ext.clone(),
                quality: job.quality.clone(),
            };
            let (tx, rx) = mpsc::channel(PROGRESS_BUFFER);
            let work = shared.transcoder.transcode(request, tx, cancel);

            match drive(shared, &job.id, work, rx, transcode_update).await {
                Ok(Outcome::Finished(success)) => JobResult::Completed {
                    filename: success
                        .output_path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string()),
                },
                Ok(Outcome::Cancelled) => JobResult::Cancelled,
                Err(e) => JobResult::Failed(e.job_message()),
            }
        }
    }
}

fn fetch_update(progress: FetchProgress) -> ProgressUpdate {
    (progress.fraction_complete, progress.resolved_filename)
}

fn transcode_update(progress: TranscodeProgress) -> ProgressUpdate {
    (Some(progress.fraction_complete), None)
}

/// Polls `work` to completion while recording the progress it reports.
async fn drive<T, E, P>(
    shared: &Shared,
    job_id: &JobId,
    work: impl Future<Output = Result<Outcome<T>, E>>,
    mut progress_rx: mpsc::Receiver<P>,
    to_update: fn(P) -> ProgressUpdate,
) -> Result<Outcome<T>, E> {
    tokio::pin!(work);

    let result = loop {
        tokio::select! {
            result = &mut work => break result,
            Some(progress) = progress_rx.recv() => {
                record_progress(shared, job_id, to_update(progress)).await;
            }
        }
    };

    // Reports sent right before the work returned
    while let Ok(progress) = progress_rx.try_recv() {
        record_progress(shared, job_id, to_update(progress)).await;
    }

    result
}

async fn record_progress(shared: &Shared, job_id: &JobId, (fraction, filename): ProgressUpdate) {
    let mut ledger = shared.ledger.lock().await;
    if let Some((progress, filename)) = ledger.apply_progress(job_id, fraction, filename) {
        shared.emit(SchedulerEvent::JobProgress {
            job_id: job_id.clone(),
            progress,
            filename,
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_progress_mapping() {
        let update = fetch_update(FetchProgress {
            fraction_complete: Some(0.25),
            resolved_filename: Some("a.mp4".to_string()),
            ..Default::default()
        });
        assert_eq!(update, (Some(0.25), Some("a.mp4".to_string())));

        let update = transcode_update(TranscodeProgress {
            fraction_complete: 0.5,
            current_time_seconds: 5.0,
            total_time_seconds: Some(10.0),
        });
        assert_eq!(update, (Some(0.5), None));
    }
}
