//! FIFO of pending jobs.

use std::collections::VecDeque;

use super::types::{Job, JobId};

/// Unbounded FIFO of pending jobs with removal by id.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job at the tail.
    pub fn push(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    /// Takes the job at the head.
    pub fn pop(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    /// Removes a job from anywhere in the queue, keeping the order of the rest.
    pub fn remove(&mut self, id: &JobId) -> Option<Job> {
        let index = self.jobs.iter().position(|j| &j.id == id)?;
        self.jobs.remove(index)
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| &j.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Empties the queue, yielding jobs in FIFO order.
    pub fn drain(&mut self) -> impl Iterator<Item = Job> + '_ {
        self.jobs.drain(..)
    }
}
