//! Executor trait for abstracting how independent captures are scheduled.
//!
//! The capture engine fans out sibling captures through this trait without
//! being tied to a specific threading implementation.

use std::fmt::Debug;
use thiserror::Error;

/// Error type for executor operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Executor error: {message}")]
pub struct ExecutorError {
    pub message: String,
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A trait for executing batches of independent tasks, potentially in parallel.
///
/// # Implementations
///
/// - `SyncExecutor`: runs every task inline on the calling thread, never queues
/// - `RayonExecutor`: work-stealing thread pool (folio-executor, feature `rayon`)
///
/// Results are always returned in input order, whichever executor runs them.
pub trait Executor: Send + Sync + Debug {
    /// Execute a batch of work items that may fail.
    ///
    /// Every item is attempted; failures do not cancel siblings.
    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static;

    /// Returns the level of parallelism this executor can provide.
    ///
    /// - Returns 1 for sequential executors
    /// - Returns the pool size for parallel executors
    fn parallelism(&self) -> usize;

    /// Returns a human-readable name for this executor (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An executor that runs every task immediately on the calling thread.
///
/// Used whenever parallel sub-captures are not recommended for a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncExecutor;

impl SyncExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for SyncExecutor {
    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static,
    {
        items.into_iter().map(f).collect()
    }

    fn parallelism(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str {
        "SyncExecutor"
    }
}
