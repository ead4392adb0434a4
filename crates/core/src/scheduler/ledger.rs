//! Single source of truth for where every job lives.
//!
//! A job is in exactly one of the queue, the active set, or a terminal
//! partition. Every move happens through a `Ledger` method together with the
//! matching status change, so callers holding the lock never see a job in
//! two places.

use tokio_util::sync::CancellationToken;

use super::queue::JobQueue;
use super::types::{DownloadsSnapshot, Job, JobId, JobStatus, PoolState, QueueStatus};

/// How a worker's execution of a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JobResult {
    Completed { filename: Option<String> },
    Failed(String),
    Cancelled,
}

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CancelOutcome {
    /// Job was running; its token was cancelled and the worker will file it.
    Active,
    /// Job was pending; it was removed from the queue and filed as cancelled.
    Pending,
    /// Job is terminal or unknown.
    NotFound,
}

#[derive(Debug)]
struct ActiveJob {
    job: Job,
    cancel: CancellationToken,
}

#[derive(Debug)]
pub(crate) struct Ledger {
    pub(crate) state: PoolState,
    pub(crate) concurrency: usize,
    queue: JobQueue,
    active: Vec<ActiveJob>,
    completed: Vec<Job>,
    failed: Vec<Job>,
}

impl Ledger {
    pub(crate) fn new(concurrency: usize) -> Self {
        Self {
            state: PoolState::Stopped,
            concurrency,
            queue: JobQueue::new(),
            active: Vec::new(),
            completed: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub(crate) fn enqueue(&mut self, job: Job) {
        self.queue.push(job);
    }

    /// Pops the queue head into the active set as `Running`.
    ///
    /// Returns a copy of the claimed job and its cancellation token.
    pub(crate) fn claim_next(&mut self) -> Option<(Job, CancellationToken)> {
        let mut job = self.queue.pop()?;
        job.transition(JobStatus::Running);
        let cancel = CancellationToken::new();
        let claimed = (job.clone(), cancel.clone());
        self.active.push(ActiveJob { job, cancel });
        Some(claimed)
    }

    /// Records progress for a running job.
    ///
    /// Returns the job's progress and filename when anything changed.
    pub(crate) fn apply_progress(
        &mut self,
        id: &JobId,
        fraction: Option<f32>,
        filename: Option<String>,
    ) -> Option<(f32, Option<String>)> {
        let entry = self.active.iter_mut().find(|a| &a.job.id == id)?;
        let job = &mut entry.job;
        if job.status != JobStatus::Running {
            return None;
        }

        let mut changed = fraction.map(|f| job.advance_progress(f)).unwrap_or(false);
        if let Some(name) = filename {
            if job.filename.as_deref() != Some(name.as_str()) {
                job.filename = Some(name);
                changed = true;
            }
        }

        changed.then(|| (job.progress, job.filename.clone()))
    }

    /// Moves a job out of the active set into its terminal partition.
    ///
    /// A job cancelled while running stays cancelled whatever the worker
    /// reports. Returns a copy of the filed job.
    pub(crate) fn finish(&mut self, id: &JobId, result: JobResult) -> Option<Job> {
        let index = self.active.iter().position(|a| &a.job.id == id)?;
        let ActiveJob { mut job, cancel } = self.active.remove(index);

        let cancelled = job.status == JobStatus::Cancelled || cancel.is_cancelled();

        match (cancelled, result) {
            (false, JobResult::Completed { filename }) => {
                if filename.is_some() {
                    job.filename = filename;
                }
                job.transition(JobStatus::Completed);
                self.completed.push(job.clone());
            }
            (false, JobResult::Failed(message)) => {
                job.fail(message);
                self.failed.push(job.clone());
            }
            _ => {
                job.transition(JobStatus::Cancelled);
                self.failed.push(job.clone());
            }
        }
        Some(job)
    }

    /// Cancels a pending or running job.
    pub(crate) fn cancel(&mut self, id: &JobId) -> CancelOutcome {
        if let Some(entry) = self.active.iter_mut().find(|a| &a.job.id == id) {
            if !entry.job.transition(JobStatus::Cancelled) {
                return CancelOutcome::NotFound;
            }
            entry.cancel.cancel();
            return CancelOutcome::Active;
        }

        match self.queue.remove(id) {
            Some(mut job) => {
                job.transition(JobStatus::Cancelled);
                self.failed.push(job);
                CancelOutcome::Pending
            }
            None => CancelOutcome::NotFound,
        }
    }

    /// Cancels every active job and files every pending job as cancelled.
    ///
    /// Returns the number of jobs cancelled.
    pub(crate) fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for entry in &mut self.active {
            if entry.job.transition(JobStatus::Cancelled) {
                cancelled += 1;
            }
            entry.cancel.cancel();
        }

        let drained: Vec<Job> = self.queue.drain().collect();
        for mut job in drained {
            job.transition(JobStatus::Cancelled);
            self.failed.push(job);
            cancelled += 1;
        }
        cancelled
    }

    /// Files jobs whose worker is gone. Used after aborting stuck workers.
    pub(crate) fn abandon_active(&mut self) -> Vec<JobId> {
        let abandoned: Vec<ActiveJob> = self.active.drain(..).collect();
        abandoned
            .into_iter()
            .map(|ActiveJob { mut job, cancel }| {
                cancel.cancel();
                job.transition(JobStatus::Cancelled);
                let id = job.id.clone();
                self.failed.push(job);
                id
            })
            .collect()
    }

    pub(crate) fn has_work(&self) -> bool {
        !self.queue.is_empty() || !self.active.is_empty()
    }

    pub(crate) fn status(&self) -> QueueStatus {
        QueueStatus {
            pending: self.queue.len(),
            active: self.active.len(),
            completed: self.completed.len(),
            failed: self.failed.len(),
            cancelled: self
                .failed
                .iter()
                .filter(|j| j.status == JobStatus::Cancelled)
                .count(),
            state: self.state,
            running: self.state != PoolState::Stopped,
            concurrency: self.concurrency,
        }
    }

    pub(crate) fn snapshot(&self) -> DownloadsSnapshot {
        DownloadsSnapshot {
            pending: self.queue.iter().cloned().collect(),
            active: self.active.iter().map(|a| a.job.clone()).collect(),
            completed: self.completed.clone(),
            failed: self.failed.clone(),
        }
    }

    /// Copy of a job wherever it currently lives.
    pub(crate) fn find(&self, id: &JobId) -> Option<Job> {
        self.queue
            .get(id)
            .or_else(|| self.active.iter().map(|a| &a.job).find(|j| &j.id == id))
            .or_else(|| self.completed.iter().find(|j| &j.id == id))
            .or_else(|| self.failed.iter().find(|j| &j.id == id))
            .cloned()
    }

    /// Drops every terminal record. Returns how many were removed.
    pub(crate) fn clear_finished(&mut self) -> usize {
        let removed = self.completed.len() + self.failed.len();
        self.completed.clear();
        self.failed.clear();
        removed
    }
}
