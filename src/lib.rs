//! # folio
//!
//! Memoized page capture over a graph of hierarchically linked pages.
//!
//! This crate ties the workspace together:
//! - **builder**: [`EngineBuilder`] assembles a [`CaptureEngine`]
//! - **config**: [`EngineConfig`], loadable from JSON
//! - **site**: [`InMemorySite`], a JSON-described site serving as producer
//!   and book registry
//!
//! ```ignore
//! use folio::{CaptureContext, CaptureLevel, EngineBuilder, InMemorySite};
//! use std::sync::Arc;
//!
//! let site = Arc::new(InMemorySite::from_file("site.json")?);
//! let engine = EngineBuilder::new().with_site(site).build()?;
//! let page = engine.run_request(|capturer| {
//!     capturer.capture(&mut CaptureContext::new(), &root, CaptureLevel::Meta)
//! })?;
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod site;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use error::FolioError;
pub use site::{InMemorySite, SiteDefinition};

// Re-export the engine surface
pub use folio_core::{
    AttributeStore, BookRef, BookRegistry, CacheStrategy, CaptureContext, CaptureEngine, CaptureError, CaptureLevel,
    CaptureScope, Capturer, Element, ElementFilter, FilteredTree, KindFilter, LinksTo, NodeRef, Page, PageIndex,
    PageProducer, PageRef, ProducerError, find_matches, prune,
};
pub use folio_core::{pages, traversal, verify};
pub use folio_executor::{Executor, ExecutorImpl, Executors};
pub use folio_traits::InMemoryBookRegistry;
