//! Load-aware concurrency decisions.
//!
//! # Features
//!
//! - **ConcurrencyCoordinator**: process-wide; turns an observed count of
//!   concurrently active requests into a [`ConcurrencyDecision`] and hands out
//!   the executor matching it
//! - **RequestConcurrency**: request-scoped; holds the decision last observed
//!   for one request so every caller at the same point sees the same answer
//! - **ActiveRequests**: the counter fed by request entry and exit
//!
//! # Example
//!
//! ```ignore
//! let coordinator = ConcurrencyCoordinator::new(Executors::new(None)?, true);
//! let active = ActiveRequests::new();
//! let request = RequestConcurrency::new();
//!
//! let _entered = active.enter();
//! request.observe(coordinator.decide(active.current()));
//! let executor = coordinator.recommended_executor(&request)?;
//! ```

use crate::error::CaptureError;
use folio_executor::{ExecutorImpl, Executors};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// The two recommendations computed for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyDecision {
    /// Fewer requests are active than the preferred concurrency.
    pub parallel_recommended: bool,
    /// Parallel is recommended and concurrent sub-captures are enabled.
    pub subcaptures_recommended: bool,
}

/// Process-wide concurrency policy, built once at startup.
#[derive(Debug, Clone)]
pub struct ConcurrencyCoordinator {
    executors: Executors,
    concurrent_subrequests: bool,
}

impl ConcurrencyCoordinator {
    pub fn new(executors: Executors, concurrent_subrequests: bool) -> Self {
        Self {
            executors,
            concurrent_subrequests,
        }
    }

    pub fn preferred_concurrency(&self) -> usize {
        self.executors.preferred_concurrency()
    }

    pub fn concurrent_subrequests(&self) -> bool {
        self.concurrent_subrequests
    }

    pub fn executors(&self) -> &Executors {
        &self.executors
    }

    /// Computes the decision for `active_count` concurrently active requests.
    pub fn decide(&self, active_count: usize) -> ConcurrencyDecision {
        let parallel_recommended = active_count < self.preferred_concurrency();
        ConcurrencyDecision {
            parallel_recommended,
            subcaptures_recommended: parallel_recommended && self.concurrent_subrequests,
        }
    }

    /// The executor for parallel processing within `request`: the
    /// per-processor pool when parallel is recommended, otherwise an inline
    /// executor that runs every task on the calling thread.
    pub fn recommended_executor(&self, request: &RequestConcurrency) -> Result<ExecutorImpl, CaptureError> {
        Ok(self.pick(request.is_parallel_recommended()?))
    }

    /// Like [`recommended_executor`](Self::recommended_executor), for
    /// sub-captures, which additionally require concurrent sub-requests to be
    /// enabled.
    pub fn subcapture_executor(&self, request: &RequestConcurrency) -> Result<ExecutorImpl, CaptureError> {
        Ok(self.pick(request.is_subcapture_recommended()?))
    }

    fn pick(&self, parallel: bool) -> ExecutorImpl {
        if parallel {
            self.executors.per_processor().clone()
        } else {
            ExecutorImpl::Sync(*self.executors.sequential())
        }
    }
}

/// The decision held for one request.
///
/// Set by [`observe`](Self::observe) whenever the active count changes and
/// otherwise never recomputed, so the answer is stable between observations.
#[derive(Debug, Default)]
pub struct RequestConcurrency {
    decision: RwLock<Option<ConcurrencyDecision>>,
}

impl RequestConcurrency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, decision: ConcurrencyDecision) {
        log::debug!(
            "Concurrency observed: parallel={}, subcaptures={}",
            decision.parallel_recommended,
            decision.subcaptures_recommended
        );
        *self.decision.write().unwrap_or_else(PoisonError::into_inner) = Some(decision);
    }

    /// Forgets the decision; queries fail until the next observation.
    pub fn clear(&self) {
        *self.decision.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The current decision.
    ///
    /// # Errors
    ///
    /// [`CaptureError::CoordinatorInactive`] when nothing has been observed.
    pub fn decision(&self) -> Result<ConcurrencyDecision, CaptureError> {
        self.decision
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ok_or(CaptureError::CoordinatorInactive)
    }

    pub fn is_parallel_recommended(&self) -> Result<bool, CaptureError> {
        Ok(self.decision()?.parallel_recommended)
    }

    pub fn is_subcapture_recommended(&self) -> Result<bool, CaptureError> {
        Ok(self.decision()?.subcaptures_recommended)
    }
}

/// Counts requests currently in progress.
///
/// Uses Release/Acquire ordering so a request entering on one thread is
/// visible to a count taken on another.
#[derive(Debug, Default)]
pub struct ActiveRequests {
    count: AtomicUsize,
}

impl ActiveRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a request as active until the returned guard drops.
    pub fn enter(&self) -> ActiveRequest<'_> {
        let count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        ActiveRequest { owner: self, count }
    }

    pub fn current(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

/// RAII marker for one active request.
#[derive(Debug)]
pub struct ActiveRequest<'a> {
    owner: &'a ActiveRequests,
    count: usize,
}

impl ActiveRequest<'_> {
    /// The active count observed on entry, this request included.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Drop for ActiveRequest<'_> {
    fn drop(&mut self) {
        self.owner.count.fetch_sub(1, Ordering::AcqRel);
    }
}
