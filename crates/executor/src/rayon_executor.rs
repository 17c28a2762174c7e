//! Rayon-based parallel executor.
//!
//! Sibling captures are independent of one another, so a work-stealing pool
//! is a natural fit for fanning them out.

use folio_traits::{Executor, ExecutorError};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

/// A parallel executor on a dedicated rayon pool, so capture fan-out does
/// not compete with other rayon users in the process.
///
/// # Example
///
/// ```ignore
/// use folio_executor::RayonExecutor;
/// use folio_traits::Executor;
///
/// let executor = RayonExecutor::with_threads(4)?;
/// let results = executor.execute_all_fallible(vec![1, 2, 0], |x| 10u32.checked_div(x).ok_or("zero"));
/// assert_eq!(results, vec![Ok(10), Ok(5), Err("zero")]);
/// ```
#[derive(Clone)]
pub struct RayonExecutor {
    pool: Arc<rayon::ThreadPool>,
    num_threads: usize,
}

impl RayonExecutor {
    /// Creates an executor with a dedicated pool of `num_threads` threads.
    pub fn with_threads(num_threads: usize) -> Result<Self, ExecutorError> {
        let num_threads = num_threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("folio-capture-{i}"))
            .build()
            .map_err(|e| ExecutorError::new(format!("failed to build capture pool: {e}")))?;
        log::debug!("[RAYON] Built dedicated capture pool with {} threads", num_threads);
        Ok(Self {
            pool: Arc::new(pool),
            num_threads,
        })
    }
}

impl fmt::Debug for RayonExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RayonExecutor")
            .field("num_threads", &self.num_threads)
            .finish()
    }
}

impl Executor for RayonExecutor {
    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static,
    {
        self.pool.install(|| items.into_par_iter().map(f).collect())
    }

    fn parallelism(&self) -> usize {
        self.num_threads
    }

    fn name(&self) -> &'static str {
        "RayonExecutor"
    }
}
