//! The capture engine and its per-request state.
//!
//! A [`CaptureEngine`] is built once and shared by every request. Each
//! request gets a [`Request`] owning one page cache, created lazily on the
//! first capture and dropped with the request. Consumers see a request only
//! as a [`Capturer`].

use crate::cache::{AttributeStore, ExclusiveCache, PageCache, SharedCache};
use crate::context::{CaptureContext, ContextGuard};
use crate::coordinator::{ActiveRequests, ConcurrencyCoordinator, RequestConcurrency};
use crate::error::{CaptureError, ProducerError};
use crate::producer::{CaptureScope, PageProducer};
use crate::verify;
use folio_executor::{Executor, Executors};
use folio_traits::BookRegistry;
use folio_types::{CaptureKey, CaptureLevel, Page, PageRef};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Which page cache a request uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    /// Shared when the request may fan sub-captures out, exclusive otherwise.
    #[default]
    Auto,
    Exclusive,
    Shared,
}

/// Engine-wide switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Verify parent/child edges whenever a page enters a request cache.
    pub verify_parent_child: bool,
    pub cache_strategy: CacheStrategy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            verify_parent_child: true,
            cache_strategy: CacheStrategy::Auto,
        }
    }
}

/// A request as consumers see it.
pub trait Capturer {
    /// Captures `page_ref` at `level`.
    ///
    /// `ctx` is the caller's ambient context. It is swapped for a clean one
    /// while the producer runs and is always restored before this returns.
    fn capture(&self, ctx: &mut CaptureContext, page_ref: &PageRef, level: CaptureLevel)
    -> Result<Arc<Page>, CaptureError>;

    /// Captures several pages, possibly in parallel.
    ///
    /// Duplicates are captured once. Results are in input order. The first
    /// failure, in input order, is returned.
    fn capture_all(
        &self,
        ctx: &CaptureContext,
        page_refs: &[PageRef],
        level: CaptureLevel,
    ) -> Result<Vec<(PageRef, Arc<Page>)>, CaptureError>;

    fn books(&self) -> &dyn BookRegistry;

    fn concurrency(&self) -> &RequestConcurrency;

    /// Memo storage for incidental values scoped to this request.
    fn attributes(&self) -> &dyn AttributeStore;
}

struct EngineShared {
    producer: Arc<dyn PageProducer>,
    books: Arc<dyn BookRegistry>,
    coordinator: ConcurrencyCoordinator,
    settings: EngineSettings,
    active: ActiveRequests,
}

/// Process-wide capture engine. Cheap to clone.
#[derive(Clone)]
pub struct CaptureEngine {
    shared: Arc<EngineShared>,
}

impl fmt::Debug for CaptureEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureEngine")
            .field("producer", &self.shared.producer.name())
            .field("books", &self.shared.books.name())
            .field("coordinator", &self.shared.coordinator)
            .field("settings", &self.shared.settings)
            .finish()
    }
}

impl CaptureEngine {
    pub fn new(
        producer: Arc<dyn PageProducer>,
        books: Arc<dyn BookRegistry>,
        executors: Executors,
        concurrent_subrequests: bool,
        settings: EngineSettings,
    ) -> Self {
        log::info!(
            "Capture engine ready: producer={}, books={}, cache={:?}, verify={}, subrequests={}",
            producer.name(),
            books.name(),
            settings.cache_strategy,
            settings.verify_parent_child,
            concurrent_subrequests
        );
        Self {
            shared: Arc::new(EngineShared {
                producer,
                books,
                coordinator: ConcurrencyCoordinator::new(executors, concurrent_subrequests),
                settings,
                active: ActiveRequests::new(),
            }),
        }
    }

    pub fn coordinator(&self) -> &ConcurrencyCoordinator {
        &self.shared.coordinator
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.shared.settings
    }

    pub fn books(&self) -> &dyn BookRegistry {
        self.shared.books.as_ref()
    }

    /// Number of requests currently inside [`run_request`](Self::run_request).
    pub fn active_requests(&self) -> usize {
        self.shared.active.current()
    }

    /// Runs one request.
    ///
    /// Counts the request as active for the duration of `f`, observes the
    /// resulting concurrency, and picks the cache from the configured
    /// strategy. The request cache is dropped when `f` returns.
    pub fn run_request<R>(&self, f: impl FnOnce(&dyn Capturer) -> R) -> R {
        let entered = self.shared.active.enter();
        let decision = self.shared.coordinator.decide(entered.count());
        let shared = match self.shared.settings.cache_strategy {
            CacheStrategy::Auto => decision.subcaptures_recommended,
            CacheStrategy::Exclusive => false,
            CacheStrategy::Shared => true,
        };
        debug!(
            "Request entered with {} active, using {} cache",
            entered.count(),
            if shared { "shared" } else { "exclusive" }
        );
        if shared {
            let request = self.shared_request();
            request.concurrency().observe(decision);
            f(&request)
        } else {
            let request = self.exclusive_request();
            request.concurrency().observe(decision);
            f(&request)
        }
    }

    /// A request confined to the calling thread. Nothing is observed yet.
    pub fn exclusive_request(&self) -> Request<ExclusiveCache> {
        Request::new(Arc::clone(&self.shared))
    }

    /// A request whose captures may run on several threads. Nothing is
    /// observed yet.
    pub fn shared_request(&self) -> Request<SharedCache> {
        Request::new(Arc::clone(&self.shared))
    }
}

/// How a cache strategy runs a batch of captures.
pub trait CaptureStrategy: PageCache + Sized + 'static {
    fn create() -> Self;

    fn capture_batch(
        request: &Request<Self>,
        ctx: &CaptureContext,
        page_refs: Vec<PageRef>,
        level: CaptureLevel,
    ) -> Result<Vec<(PageRef, Arc<Page>)>, CaptureError>;
}

fn capture_sequential<C: CaptureStrategy>(
    request: &Request<C>,
    ctx: &CaptureContext,
    page_refs: Vec<PageRef>,
    level: CaptureLevel,
) -> Result<Vec<(PageRef, Arc<Page>)>, CaptureError> {
    let mut ctx = ctx.clone();
    page_refs
        .into_iter()
        .map(|page_ref| {
            let page = request.capture_page(&mut ctx, &page_ref, level)?;
            Ok::<_, CaptureError>((page_ref, page))
        })
        .collect()
}

impl CaptureStrategy for ExclusiveCache {
    fn create() -> Self {
        ExclusiveCache::new()
    }

    fn capture_batch(
        request: &Request<Self>,
        ctx: &CaptureContext,
        page_refs: Vec<PageRef>,
        level: CaptureLevel,
    ) -> Result<Vec<(PageRef, Arc<Page>)>, CaptureError> {
        capture_sequential(request, ctx, page_refs, level)
    }
}

impl CaptureStrategy for SharedCache {
    fn create() -> Self {
        SharedCache::new()
    }

    fn capture_batch(
        request: &Request<Self>,
        ctx: &CaptureContext,
        page_refs: Vec<PageRef>,
        level: CaptureLevel,
    ) -> Result<Vec<(PageRef, Arc<Page>)>, CaptureError> {
        if page_refs.len() < 2 || !request.concurrency().is_subcapture_recommended()? {
            return capture_sequential(request, ctx, page_refs, level);
        }
        let executor = request.state.engine.coordinator.subcapture_executor(request.concurrency())?;
        debug!("Capturing {} pages at {} on {}", page_refs.len(), level, executor.name());

        let request = request.clone();
        let ctx = ctx.clone();
        executor
            .execute_all_fallible(page_refs, move |page_ref| {
                let mut ctx = ctx.clone();
                let page = request.capture_page(&mut ctx, &page_ref, level)?;
                Ok::<_, CaptureError>((page_ref, page))
            })
            .into_iter()
            .collect()
    }
}

struct RequestState<C> {
    engine: Arc<EngineShared>,
    cache: OnceLock<C>,
    concurrency: RequestConcurrency,
}

/// One top-level processing unit and its page cache.
///
/// `Request<ExclusiveCache>` is neither `Send` nor `Sync`; only
/// `Request<SharedCache>` can fan captures out across threads.
pub struct Request<C> {
    state: Arc<RequestState<C>>,
}

impl<C> Clone for Request<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for Request<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("cache", &self.state.cache.get())
            .field("concurrency", &self.state.concurrency)
            .finish()
    }
}

impl<C: CaptureStrategy> Request<C> {
    fn new(engine: Arc<EngineShared>) -> Self {
        Self {
            state: Arc::new(RequestState {
                engine,
                cache: OnceLock::new(),
                concurrency: RequestConcurrency::new(),
            }),
        }
    }

    /// The request cache, created on first use.
    pub fn cache(&self) -> &C {
        self.state.cache.get_or_init(C::create)
    }

    /// Whether anything has been cached yet.
    pub fn has_cache(&self) -> bool {
        self.state.cache.get().is_some()
    }

    /// Hook for the active-request count changing while this request runs.
    pub fn on_concurrency_changed(&self, active_count: usize) {
        let decision = self.state.engine.coordinator.decide(active_count);
        self.state.concurrency.observe(decision);
    }

    /// Hook for the count no longer being tracked for this request.
    pub fn on_concurrency_cleared(&self) {
        self.state.concurrency.clear();
    }

    fn capture_page(
        &self,
        ctx: &mut CaptureContext,
        page_ref: &PageRef,
        level: CaptureLevel,
    ) -> Result<Arc<Page>, CaptureError> {
        let key = CaptureKey::new(page_ref.clone(), level);
        if let Some(key) = &key {
            if let Some(page) = self.cache().get(key) {
                debug!("Cache hit for {key}");
                return Ok(page);
            }
            debug!("Cache miss for {key}");
        }

        let produced = {
            let mut nested = ContextGuard::swap(ctx, CaptureContext::for_capture(level));
            let mut scope = CaptureScope::new(self, &mut nested);
            self.state.engine.producer.produce(&mut scope, page_ref)
        };
        let page = match produced {
            Ok(Some(page)) => page,
            Ok(None) => {
                return Err(CaptureError::NoPageCaptured {
                    page_ref: page_ref.clone(),
                });
            }
            Err(ProducerError::Capture(err)) => return Err(err),
            Err(ProducerError::Failed(message)) => {
                return Err(CaptureError::Producer {
                    page_ref: page_ref.clone(),
                    message,
                });
            }
        };
        if page.page_ref() != page_ref {
            return Err(CaptureError::ProducerMismatch {
                expected: page_ref.clone(),
                actual: page.page_ref().clone(),
            });
        }

        let page = Arc::new(page);
        if let Some(key) = key {
            let cache = self.cache();
            cache.put(key, Arc::clone(&page));
            if self.state.engine.settings.verify_parent_child {
                let books = self.state.engine.books.as_ref();
                cache
                    .verify_with(|cache, unverified| verify::verify_added(cache, unverified, books, &page))
                    .inspect_err(|err| warn!("Edge verification failed for {page_ref}: {err}"))?;
            }
        }
        Ok(page)
    }
}

impl<C: CaptureStrategy> Capturer for Request<C> {
    fn capture(
        &self,
        ctx: &mut CaptureContext,
        page_ref: &PageRef,
        level: CaptureLevel,
    ) -> Result<Arc<Page>, CaptureError> {
        self.capture_page(ctx, page_ref, level)
    }

    fn capture_all(
        &self,
        ctx: &CaptureContext,
        page_refs: &[PageRef],
        level: CaptureLevel,
    ) -> Result<Vec<(PageRef, Arc<Page>)>, CaptureError> {
        let mut seen = HashSet::with_capacity(page_refs.len());
        let unique: Vec<PageRef> = page_refs.iter().filter(|r| seen.insert(*r)).cloned().collect();
        C::capture_batch(self, ctx, unique, level)
    }

    fn books(&self) -> &dyn BookRegistry {
        self.state.engine.books.as_ref()
    }

    fn concurrency(&self) -> &RequestConcurrency {
        &self.state.concurrency
    }

    fn attributes(&self) -> &dyn AttributeStore {
        self.cache()
    }
}
