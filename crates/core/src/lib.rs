//! # folio-core
//!
//! The page capture engine.
//!
//! This crate provides:
//! - **cache**: per-request page caches, exclusive and shared
//! - **engine**: memoized capture with identity checks and edge verification
//! - **coordinator**: load-aware decisions on fanning sub-captures out
//! - **traversal**: the reachability filter and related graph walks
//! - **verify**: parent/child edge agreement checks
//!
//! ## Design Principle
//!
//! Content generation is not done here. A [`PageProducer`] generates pages
//! and a [`BookRegistry`] says which books can be captured from; the engine
//! only decides when to call the producer and checks what comes back.

// Re-export foundation crates
pub use folio_traits as traits;
pub use folio_types as types;

pub mod cache;
pub mod context;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod page_index;
pub mod pages;
pub mod producer;
pub mod traversal;
pub mod verify;

pub use cache::{AttributeStore, ExclusiveCache, PageCache, SharedCache, UnverifiedEdges};
pub use context::{CaptureContext, ContextGuard};
pub use coordinator::{ActiveRequests, ConcurrencyCoordinator, ConcurrencyDecision, RequestConcurrency};
pub use engine::{CacheStrategy, CaptureEngine, CaptureStrategy, Capturer, EngineSettings, Request};
pub use error::{CaptureError, ProducerError};
pub use page_index::PageIndex;
pub use producer::{CaptureScope, PageProducer};
pub use traversal::{ElementFilter, FilteredTree, KindFilter, LinksTo, find_matches, prune};

pub use folio_executor::{Executor, ExecutorImpl, Executors};
pub use folio_traits::{BookRegistry, InMemoryBookRegistry};
pub use folio_types::{BookRef, CaptureKey, CaptureLevel, Element, NodeRef, Page, PageRef};
