// src/builder.rs
use crate::config::EngineConfig;
use crate::error::FolioError;
use crate::site::InMemorySite;
use folio_core::{BookRegistry, CacheStrategy, CaptureEngine, Executors, PageProducer};
use std::path::Path;
use std::sync::Arc;

/// A builder for creating a [`CaptureEngine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    producer: Option<Arc<dyn PageProducer>>,
    books: Option<Arc<dyn BookRegistry>>,
}

impl EngineBuilder {
    /// Creates a new `EngineBuilder` with default settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the configuration from a JSON file.
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, FolioError> {
        self.config = EngineConfig::from_file(path)?;
        Ok(self)
    }

    /// Allows independent sub-captures to run in parallel when load permits.
    pub fn with_concurrent_subrequests(mut self, enabled: bool) -> Self {
        self.config.concurrent_subrequests = enabled;
        self
    }

    /// Overrides the preferred concurrency, which otherwise defaults to the
    /// number of CPUs.
    pub fn with_preferred_concurrency(mut self, preferred: usize) -> Self {
        self.config.preferred_concurrency = Some(preferred);
        self
    }

    pub fn with_cache_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.config.cache_strategy = strategy;
        self
    }

    pub fn with_verify_parent_child(mut self, verify: bool) -> Self {
        self.config.verify_parent_child = verify;
        self
    }

    /// Sets the collaborator that generates pages.
    pub fn with_producer(mut self, producer: Arc<dyn PageProducer>) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Sets the collaborator that answers book accessibility.
    pub fn with_books(mut self, books: Arc<dyn BookRegistry>) -> Self {
        self.books = Some(books);
        self
    }

    /// Uses an in-memory site as both producer and book registry.
    pub fn with_site(self, site: Arc<InMemorySite>) -> Self {
        let books: Arc<dyn BookRegistry> = site.clone();
        self.with_producer(site).with_books(books)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the builder and creates the `CaptureEngine`.
    pub fn build(self) -> Result<CaptureEngine, FolioError> {
        let producer = self.producer.ok_or_else(|| {
            FolioError::Config("No page producer has been configured. Use `with_producer` or `with_site`.".to_string())
        })?;
        let books = self.books.ok_or_else(|| {
            FolioError::Config("No book registry has been configured. Use `with_books` or `with_site`.".to_string())
        })?;

        let executors = Executors::new(self.config.preferred_concurrency)?;
        Ok(CaptureEngine::new(
            producer,
            books,
            executors,
            self.config.concurrent_subrequests,
            self.config.settings(),
        ))
    }
}
