//! Batch scheduler: a bounded-concurrency work queue for download and
//! conversion jobs.
//!
//! Jobs are submitted to a FIFO queue and claimed by a fixed pool of worker
//! tasks. Each job moves `Pending -> Running -> {Completed | Failed |
//! Cancelled}` (or straight from `Pending` to `Cancelled`). One lock guards
//! the queue, the active set, the terminal partitions and the pool state, so
//! every status read sees a consistent picture. Observers subscribe to a
//! broadcast stream of [`SchedulerEvent`]s.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = BatchScheduler::new(
//!     SchedulerConfig::default(),
//!     Arc::new(PlatformRegistry::builtin()),
//!     Arc::new(YtDlpFetcher::with_defaults()),
//!     Arc::new(FfmpegTranscoder::with_defaults()),
//! );
//! let mut events = scheduler.subscribe();
//! scheduler.start().await;
//!
//! let id = scheduler
//!     .submit(JobRequest::audio("https://soundcloud.com/artist/track", "/music"))
//!     .await?;
//! ```

mod config;
mod error;
mod ledger;
mod queue;
mod types;
mod worker;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use queue::JobQueue;
pub use types::{
    BatchOptions, DownloadsSnapshot, Job, JobId, JobKind, JobRequest, JobStatus, PoolState,
    QueueStatus, SchedulerEvent,
};

use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::fetcher::Fetcher;
use crate::platform::{clamp_quality, normalize_url, PlatformResolver};
use crate::transcoder::Transcoder;

use ledger::{CancelOutcome, Ledger};

/// State shared between the scheduler handle and its workers.
struct Shared {
    config: SchedulerConfig,
    fetcher: Arc<dyn Fetcher>,
    transcoder: Arc<dyn Transcoder>,
    ledger: Mutex<Ledger>,
    /// Wakes idle or parked workers.
    wake: Notify,
    events: broadcast::Sender<SchedulerEvent>,
}

impl Shared {
    fn emit(&self, event: SchedulerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Owns the job queue and the worker pool.
pub struct BatchScheduler {
    shared: Arc<Shared>,
    resolver: Arc<dyn PlatformResolver>,
    /// Worker handles. Lifecycle operations take this lock before the ledger.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl BatchScheduler {
    /// Creates a stopped scheduler.
    pub fn new(
        config: SchedulerConfig,
        resolver: Arc<dyn PlatformResolver>,
        fetcher: Arc<dyn Fetcher>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let ledger = Ledger::new(config.concurrency.max(1));

        Self {
            shared: Arc::new(Shared {
                config,
                fetcher,
                transcoder,
                ledger: Mutex::new(ledger),
                wake: Notify::new(),
                events,
            }),
            resolver,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribes to scheduler events.
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.shared.events.subscribe()
    }

    /// Validates a request and queues it. Never waits on running work.
    pub async fn submit(&self, request: JobRequest) -> Result<JobId, SchedulerError> {
        let job = self.prepare(request)?;
        let id = job.id.clone();

        {
            let mut ledger = self.shared.ledger.lock().await;
            let event = SchedulerEvent::JobAdded {
                job_id: id.clone(),
                kind: job.kind,
                url: job.url.clone(),
            };
            debug!(job_id = %id, url = %job.url, "Job queued");
            ledger.enqueue(job);
            self.shared.emit(event);
        }

        self.shared.wake.notify_one();
        Ok(id)
    }

    /// Submits one job per URL. Outcomes line up with the input order.
    pub async fn submit_batch<I, S>(
        &self,
        urls: I,
        options: &BatchOptions,
    ) -> Vec<Result<JobId, SchedulerError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();
        for url in urls {
            let result = self.submit(options.request_for(url.as_ref())).await;
            if let Err(e) = &result {
                debug!(url = url.as_ref(), error = %e, "Batch entry rejected");
            }
            results.push(result);
        }
        info!(
            submitted = results.iter().filter(|r| r.is_ok()).count(),
            rejected = results.iter().filter(|r| r.is_err()).count(),
            "Batch submitted"
        );
        results
    }

    fn prepare(&self, mut request: JobRequest) -> Result<Job, SchedulerError> {
        if !request.kind.is_download() {
            let input = request.url.trim();
            if input.is_empty() {
                return Err(SchedulerError::EmptyInput);
            }
            request.url = input.to_string();
            return Ok(Job::new(request, None));
        }

        let info = self.resolver.validate(&request.url)?;
        if let Some(normalized) = normalize_url(&request.url) {
            request.url = normalized.text;
        }
        if request.kind == JobKind::Video {
            request.quality = clamp_quality(&info, &request.quality);
        }
        Ok(Job::new(request, Some(info.name)))
    }

    /// Spawns the worker pool. Warns and does nothing if already started.
    pub async fn start(&self) {
        let mut workers = self.workers.lock().await;
        let mut ledger = self.shared.ledger.lock().await;
        self.start_locked(&mut workers, &mut ledger);
    }

    fn start_locked(&self, workers: &mut Vec<JoinHandle<()>>, ledger: &mut Ledger) {
        if ledger.state != PoolState::Stopped {
            warn!("Scheduler already running");
            return;
        }

        ledger.state = PoolState::Running;
        let concurrency = ledger.concurrency;
        info!(concurrency, pending = ledger.status().pending, "Starting batch scheduler");
        self.shared.emit(SchedulerEvent::BatchStarted { concurrency });

        for worker in 0..concurrency {
            workers.push(tokio::spawn(worker::run(self.shared.clone(), worker)));
        }
    }

    /// Stops the pool.
    ///
    /// Running jobs are cancelled, pending jobs are filed as cancelled
    /// without running, and workers are joined. A worker that does not exit
    /// within the shutdown timeout is aborted. Safe to call repeatedly.
    pub async fn stop(&self) {
        let mut workers = self.workers.lock().await;

        {
            let mut ledger = self.shared.ledger.lock().await;
            let was_stopped = ledger.state == PoolState::Stopped;
            ledger.state = PoolState::Stopped;
            let cancelled = ledger.cancel_all();

            if was_stopped && cancelled == 0 && workers.is_empty() {
                debug!("Scheduler already stopped");
                return;
            }
            info!(cancelled, "Stopping batch scheduler");
            self.shared.emit(SchedulerEvent::BatchStopped { cancelled });
        }

        self.shared.wake.notify_waiters();

        let shutdown_timeout = self.shared.config.shutdown_timeout();
        for (worker, mut handle) in workers.drain(..).enumerate() {
            match timeout(shutdown_timeout, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(worker, error = %e, "Worker ended abnormally"),
                Err(_) => {
                    warn!(worker, ?shutdown_timeout, "Worker did not stop in time, aborting");
                    handle.abort();
                }
            }
        }

        let mut ledger = self.shared.ledger.lock().await;
        for job_id in ledger.abandon_active() {
            warn!(job_id = %job_id, "Filing job left behind by an aborted worker");
            self.shared.emit(SchedulerEvent::DownloadCompleted {
                job_id,
                status: JobStatus::Cancelled,
                error_message: None,
                filename: None,
            });
        }
        info!("Batch scheduler stopped");
    }

    /// Pauses the pool. Running jobs finish; no new job is claimed.
    ///
    /// Returns `false` unless the pool was running.
    pub async fn pause(&self) -> bool {
        let mut ledger = self.shared.ledger.lock().await;
        if ledger.state != PoolState::Running {
            return false;
        }
        ledger.state = PoolState::Paused;
        info!("Batch scheduler paused");
        self.shared.emit(SchedulerEvent::BatchPaused);
        true
    }

    /// Resumes a paused pool, or starts a stopped one that has work waiting.
    ///
    /// Returns `false` when there was nothing to do.
    pub async fn resume(&self) -> bool {
        let mut workers = self.workers.lock().await;
        let mut ledger = self.shared.ledger.lock().await;

        match ledger.state {
            PoolState::Paused => {
                ledger.state = PoolState::Running;
                info!("Batch scheduler resumed");
                self.shared.emit(SchedulerEvent::BatchResumed);
                drop(ledger);
                self.shared.wake.notify_waiters();
                true
            }
            PoolState::Stopped if ledger.has_work() => {
                self.start_locked(&mut workers, &mut ledger);
                true
            }
            _ => false,
        }
    }

    /// Cancels a pending or running job.
    ///
    /// A pending job is taken out of the queue and never runs; a running job
    /// has its cancellation token fired. Returns `false` for terminal or
    /// unknown jobs.
    pub async fn remove_job(&self, id: &JobId) -> bool {
        let mut ledger = self.shared.ledger.lock().await;
        match ledger.cancel(id) {
            CancelOutcome::Active => {
                info!(job_id = %id, "Cancelling running job");
            }
            CancelOutcome::Pending => {
                info!(job_id = %id, "Removed pending job");
            }
            CancelOutcome::NotFound => return false,
        }
        self.shared
            .emit(SchedulerEvent::JobCancelled { job_id: id.clone() });
        true
    }

    /// Changes the worker count. Only allowed while stopped.
    pub async fn set_concurrency(&self, concurrency: usize) -> Result<(), SchedulerError> {
        if concurrency == 0 {
            return Err(SchedulerError::InvalidConcurrency(concurrency));
        }
        let mut ledger = self.shared.ledger.lock().await;
        if ledger.state != PoolState::Stopped {
            return Err(SchedulerError::ConcurrencyLocked);
        }
        ledger.concurrency = concurrency;
        info!(concurrency, "Concurrency updated");
        Ok(())
    }

    pub async fn queue_status(&self) -> QueueStatus {
        self.shared.ledger.lock().await.status()
    }

    /// Owned copies of every job, grouped by partition.
    pub async fn all_downloads(&self) -> DownloadsSnapshot {
        self.shared.ledger.lock().await.snapshot()
    }

    /// Copy of a single job.
    pub async fn job(&self, id: &JobId) -> Option<Job> {
        self.shared.ledger.lock().await.find(id)
    }

    /// Drops completed, failed and cancelled records.
    pub async fn clear_finished(&self) -> usize {
        let removed = self.shared.ledger.lock().await.clear_finished();
        debug!(removed, "Cleared finished jobs");
        removed
    }

    pub async fn state(&self) -> PoolState {
        self.shared.ledger.lock().await.state
    }

    pub fn resolver(&self) -> &Arc<dyn PlatformResolver> {
        &self.resolver
    }

    /// The fetcher workers download with, for metadata lookups.
    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.shared.fetcher
    }
}

impl Drop for BatchScheduler {
    fn drop(&mut self) {
        for handle in self.workers.get_mut().drain(..) {
            handle.abort();
        }
    }
}
