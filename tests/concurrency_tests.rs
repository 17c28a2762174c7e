mod common;

use common::fixtures::{one_sided_site, scenario_site, wide_site};
use common::{TestResult, docs, engine_with, init_logging, load_site, sequential_engine};
use folio::{
    CacheStrategy, CaptureContext, CaptureEngine, CaptureError, CaptureLevel, CaptureScope, Capturer, EngineBuilder,
    EngineConfig, InMemorySite, Page, PageProducer, PageRef, ProducerError,
};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

fn parallel_config(preferred: usize) -> EngineConfig {
    EngineConfig {
        concurrent_subrequests: true,
        preferred_concurrency: Some(preferred),
        ..EngineConfig::default()
    }
}

#[test]
fn test_decision_reflects_active_requests() -> TestResult {
    let site = load_site(&scenario_site())?;
    let engine = engine_with(&site, parallel_config(2))?;

    engine.run_request(|outer| -> TestResult {
        let outer_decision = outer.concurrency().decision()?;
        assert!(outer_decision.parallel_recommended);
        assert!(outer_decision.subcaptures_recommended);

        engine.run_request(|inner| -> TestResult {
            assert_eq!(engine.active_requests(), 2);
            assert!(!inner.concurrency().is_parallel_recommended()?);
            Ok(())
        })?;

        // The outer request keeps the answer it observed on entry.
        assert_eq!(outer.concurrency().decision()?, outer_decision);
        Ok(())
    })?;
    assert_eq!(engine.active_requests(), 0);
    Ok(())
}

#[test]
fn test_subcaptures_disabled_by_default() -> TestResult {
    let site = load_site(&scenario_site())?;
    let config = EngineConfig {
        preferred_concurrency: Some(8),
        ..EngineConfig::default()
    };
    let engine = engine_with(&site, config)?;
    engine.run_request(|capturer| -> TestResult {
        assert!(capturer.concurrency().is_parallel_recommended()?);
        assert!(!capturer.concurrency().is_subcapture_recommended()?);
        Ok(())
    })
}

#[test]
fn test_decision_stable_until_observed_again() -> TestResult {
    let site = load_site(&scenario_site())?;
    let engine = engine_with(&site, parallel_config(2))?;
    let request = engine.shared_request();

    request.on_concurrency_changed(1);
    let first = request.concurrency().decision()?;
    for _ in 0..3 {
        assert_eq!(request.concurrency().decision()?, first);
    }

    request.on_concurrency_changed(5);
    assert!(!request.concurrency().is_parallel_recommended()?);

    request.on_concurrency_cleared();
    assert_eq!(request.concurrency().decision(), Err(CaptureError::CoordinatorInactive));
    Ok(())
}

#[test]
fn test_query_before_observation_fails() -> TestResult {
    let site = load_site(&scenario_site())?;
    let engine = engine_with(&site, parallel_config(4))?;
    let request = engine.shared_request();

    assert_eq!(request.concurrency().is_subcapture_recommended(), Err(CaptureError::CoordinatorInactive));
    assert!(engine.coordinator().recommended_executor(request.concurrency()).is_err());

    let refs = [docs("/a"), docs("/b")];
    let err = request
        .capture_all(&CaptureContext::new(), &refs, CaptureLevel::Page)
        .unwrap_err();
    assert_eq!(err, CaptureError::CoordinatorInactive);
    Ok(())
}

#[test]
fn test_parallel_fan_out_produces_each_page_once() -> TestResult {
    init_logging();
    let site = load_site(&wide_site(32))?;
    let engine = engine_with(&site, parallel_config(4))?;

    engine.run_request(|capturer| -> TestResult {
        assert!(capturer.concurrency().is_subcapture_recommended()?);
        let ctx = CaptureContext::new();
        let refs: Vec<PageRef> = (0..32).map(|i| docs(&format!("/p{i}"))).collect();

        let pages = capturer.capture_all(&ctx, &refs, CaptureLevel::Meta)?;
        assert_eq!(pages.len(), 32);
        for ((page_ref, page), expected) in pages.iter().zip(&refs) {
            assert_eq!(page_ref, expected);
            assert_eq!(page.page_ref(), expected);
        }
        assert_eq!(site.production_count(), 32);

        let again = capturer.capture_all(&ctx, &refs, CaptureLevel::Meta)?;
        assert_eq!(site.production_count(), 32);
        assert!(again.iter().zip(&pages).all(|((_, a), (_, b))| Arc::ptr_eq(a, b)));

        // The root verifies against 32 children already in the cache.
        capturer.capture(&mut CaptureContext::new(), &docs("/"), CaptureLevel::Page)?;
        Ok(())
    })
}

#[test]
fn test_parallel_fan_out_reports_edge_failures() -> TestResult {
    let site = load_site(&one_sided_site(false))?;
    let config = EngineConfig {
        cache_strategy: CacheStrategy::Shared,
        ..parallel_config(4)
    };
    let engine = engine_with(&site, config)?;
    let err = engine
        .run_request(|capturer| {
            let ctx = CaptureContext::new();
            capturer.capture_all(&ctx, &[docs("/b")], CaptureLevel::Page)?;
            capturer.capture_all(&ctx, &[docs("/a"), docs("/b")], CaptureLevel::Page)
        })
        .unwrap_err();
    assert!(err.is_edge_inconsistency());
    Ok(())
}

#[test]
fn test_disagreeing_edge_fails_within_one_batch() -> TestResult {
    let site = load_site(&one_sided_site(false))?;
    let config = EngineConfig {
        cache_strategy: CacheStrategy::Shared,
        ..parallel_config(4)
    };
    let engine = engine_with(&site, config)?;
    for _ in 0..8 {
        // Whichever endpoint lands second reports the same edge.
        let err = engine
            .run_request(|capturer| {
                capturer.capture_all(&CaptureContext::new(), &[docs("/a"), docs("/b")], CaptureLevel::Page)
            })
            .unwrap_err();
        assert_eq!(
            err,
            CaptureError::ChildMismatch {
                page: docs("/a"),
                child: docs("/b"),
            }
        );
    }
    Ok(())
}

/// Serves an in-memory site and records which thread produced each page.
#[derive(Debug)]
struct ThreadRecordingProducer {
    site: Arc<InMemorySite>,
    threads: Mutex<Vec<ThreadId>>,
}

impl PageProducer for ThreadRecordingProducer {
    fn produce(&self, scope: &mut CaptureScope<'_>, page_ref: &PageRef) -> Result<Option<Page>, ProducerError> {
        self.threads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(thread::current().id());
        self.site.produce(scope, page_ref)
    }
}

fn recording_engine(
    site: &Arc<InMemorySite>,
    strategy: CacheStrategy,
) -> Result<(CaptureEngine, Arc<ThreadRecordingProducer>), Box<dyn std::error::Error>> {
    let producer = Arc::new(ThreadRecordingProducer {
        site: Arc::clone(site),
        threads: Mutex::new(Vec::new()),
    });
    let engine = EngineBuilder::new()
        .with_config(EngineConfig {
            cache_strategy: strategy,
            ..parallel_config(4)
        })
        .with_producer(producer.clone())
        .with_books(site.clone())
        .build()?;
    Ok((engine, producer))
}

#[test]
fn test_exclusive_strategy_captures_on_the_caller_thread() -> TestResult {
    let site = load_site(&wide_site(8))?;
    let (engine, producer) = recording_engine(&site, CacheStrategy::Exclusive)?;
    let refs: Vec<PageRef> = (0..8).map(|i| docs(&format!("/p{i}"))).collect();

    let pages = engine.run_request(|capturer| capturer.capture_all(&CaptureContext::new(), &refs, CaptureLevel::Page))?;
    assert_eq!(pages.len(), 8);

    let caller = thread::current().id();
    let threads = producer.threads.lock().map_err(|_| "poisoned")?;
    assert_eq!(threads.len(), 8);
    assert!(threads.iter().all(|id| *id == caller));
    Ok(())
}

#[cfg(feature = "rayon-executor")]
#[test]
fn test_shared_strategy_fans_out_to_the_pool() -> TestResult {
    let site = load_site(&wide_site(8))?;
    let (engine, producer) = recording_engine(&site, CacheStrategy::Shared)?;
    let refs: Vec<PageRef> = (0..8).map(|i| docs(&format!("/p{i}"))).collect();

    engine.run_request(|capturer| capturer.capture_all(&CaptureContext::new(), &refs, CaptureLevel::Page))?;

    let caller = thread::current().id();
    let threads = producer.threads.lock().map_err(|_| "poisoned")?;
    assert_eq!(threads.len(), 8);
    assert!(threads.iter().all(|id| *id != caller));
    Ok(())
}

#[test]
fn test_requests_on_many_threads_are_independent() -> TestResult {
    let site = load_site(&scenario_site())?;
    let engine = sequential_engine(&site)?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                engine.run_request(|capturer| {
                    let mut ctx = CaptureContext::new();
                    capturer
                        .capture(&mut ctx, &docs("/a"), CaptureLevel::Meta)
                        .map(|page| page.title.clone())
                })
            })
        })
        .collect();
    for handle in handles {
        let title = handle.join().map_err(|_| "request thread panicked")??;
        assert_eq!(title, "Child A");
    }
    // One production per request: caches are never shared between requests.
    assert_eq!(site.production_count(), 4);
    assert_eq!(engine.active_requests(), 0);
    Ok(())
}
