#![allow(dead_code)]

pub mod fixtures;

use folio::{BookRef, CaptureEngine, EngineBuilder, EngineConfig, FolioError, InMemorySite, PageRef};
use serde_json::Value;
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The book every fixture site puts its pages in.
pub fn docs_book() -> BookRef {
    BookRef::new("example.com", "/docs")
}

/// A reference to `path` in the fixture book.
pub fn docs(path: &str) -> PageRef {
    PageRef::new(docs_book(), path)
}

/// Builds an in-memory site from a JSON definition
pub fn load_site(definition: &Value) -> Result<Arc<InMemorySite>, FolioError> {
    let source = serde_json::to_string(definition)?;
    Ok(Arc::new(InMemorySite::from_json(&source)?))
}

/// An engine over `site` with default settings and a single preferred
/// processor, so requests never fan out.
pub fn sequential_engine(site: &Arc<InMemorySite>) -> Result<CaptureEngine, FolioError> {
    engine_with(site, EngineConfig {
        preferred_concurrency: Some(1),
        ..EngineConfig::default()
    })
}

pub fn engine_with(site: &Arc<InMemorySite>, config: EngineConfig) -> Result<CaptureEngine, FolioError> {
    EngineBuilder::new()
        .with_config(config)
        .with_site(Arc::clone(site))
        .build()
}
