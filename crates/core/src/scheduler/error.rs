//! Error types for the scheduler.

use thiserror::Error;

use crate::platform::ResolveError;

/// Errors returned synchronously by scheduler operations.
///
/// Failures of the work itself never surface here; they are recorded on the
/// job as `Failed` with an error message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// The URL was rejected by the platform resolver.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A conversion job was submitted without an input path.
    #[error("Input path cannot be empty")]
    EmptyInput,

    /// Concurrency must be at least one worker.
    #[error("Concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    /// Concurrency can only change while the pool is stopped.
    #[error("Concurrency can only be changed while the scheduler is stopped")]
    ConcurrencyLocked,
}
