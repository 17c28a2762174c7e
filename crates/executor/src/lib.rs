//! Executor implementations for the folio capture engine.
//!
//! ## Available Executors
//!
//! - [`RayonExecutor`]: Work-stealing thread pool (feature: `rayon`)
//! - [`SyncExecutor`]: Inline, sequential execution (re-exported from folio-traits)
//!
//! [`Executors`] bundles one of each together with the process-wide
//! preferred concurrency, computed once at startup.

#[cfg(feature = "rayon")]
mod rayon_executor;

#[cfg(feature = "rayon")]
pub use rayon_executor::RayonExecutor;

// Re-export from folio-traits
pub use folio_traits::{Executor, ExecutorError, SyncExecutor};

/// A type-erased executor that wraps concrete executor implementations.
///
/// Since the `Executor` trait has generic methods, it cannot be used as a trait object
/// (`dyn Executor`). This enum holds the concrete executor types and delegates to them.
#[derive(Clone, Debug)]
pub enum ExecutorImpl {
    /// Sequential executor (no parallelism)
    Sync(SyncExecutor),

    /// Rayon work-stealing thread pool executor
    #[cfg(feature = "rayon")]
    Rayon(RayonExecutor),
}

impl ExecutorImpl {
    pub fn is_parallel(&self) -> bool {
        !matches!(self, ExecutorImpl::Sync(_))
    }
}

impl Executor for ExecutorImpl {
    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static,
    {
        match self {
            ExecutorImpl::Sync(exec) => exec.execute_all_fallible(items, f),
            #[cfg(feature = "rayon")]
            ExecutorImpl::Rayon(exec) => exec.execute_all_fallible(items, f),
        }
    }

    fn parallelism(&self) -> usize {
        match self {
            ExecutorImpl::Sync(exec) => exec.parallelism(),
            #[cfg(feature = "rayon")]
            ExecutorImpl::Rayon(exec) => exec.parallelism(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ExecutorImpl::Sync(exec) => exec.name(),
            #[cfg(feature = "rayon")]
            ExecutorImpl::Rayon(exec) => exec.name(),
        }
    }
}

/// The executors shared by every request of an engine.
#[derive(Clone, Debug)]
pub struct Executors {
    per_processor: ExecutorImpl,
    sequential: SyncExecutor,
    preferred_concurrency: usize,
}

impl Executors {
    /// Builds the shared executors.
    ///
    /// `preferred_concurrency` defaults to the number of available CPUs. With
    /// the `rayon` feature the per-processor executor gets a dedicated pool of
    /// that size; without it, every task runs inline.
    pub fn new(preferred_concurrency: Option<usize>) -> Result<Self, ExecutorError> {
        let preferred_concurrency = preferred_concurrency.unwrap_or_else(num_cpus::get).max(1);

        #[cfg(feature = "rayon")]
        let per_processor = ExecutorImpl::Rayon(RayonExecutor::with_threads(preferred_concurrency)?);
        #[cfg(not(feature = "rayon"))]
        let per_processor = ExecutorImpl::Sync(SyncExecutor::new());

        log::info!(
            "Executors ready: per-processor={} ({} threads), preferred concurrency={}",
            per_processor.name(),
            per_processor.parallelism(),
            preferred_concurrency
        );
        Ok(Self {
            per_processor,
            sequential: SyncExecutor::new(),
            preferred_concurrency,
        })
    }

    /// Executors that never run anything in parallel.
    pub fn sequential_only() -> Self {
        Self {
            per_processor: ExecutorImpl::Sync(SyncExecutor::new()),
            sequential: SyncExecutor::new(),
            preferred_concurrency: 1,
        }
    }

    /// The number of concurrently active requests below which parallel
    /// processing is recommended.
    pub fn preferred_concurrency(&self) -> usize {
        self.preferred_concurrency
    }

    pub fn per_processor(&self) -> &ExecutorImpl {
        &self.per_processor
    }

    pub fn sequential(&self) -> &SyncExecutor {
        &self.sequential
    }
}
