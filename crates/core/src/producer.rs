//! The page-producer collaborator and the scope it produces under.

use crate::context::CaptureContext;
use crate::engine::Capturer;
use crate::error::{CaptureError, ProducerError};
use folio_traits::BookRegistry;
use folio_types::{CaptureLevel, Page, PageRef};
use std::fmt::Debug;
use std::sync::Arc;

/// Produces the materialized page for a reference.
///
/// Implementations generate content; the engine only memoizes, validates and
/// verifies what they return. A producer may capture other pages through the
/// scope while producing its own.
pub trait PageProducer: Send + Sync + Debug {
    /// Produces `page_ref` at `scope.level()`.
    ///
    /// Returning `Ok(None)` means no page exists for the reference.
    fn produce(&self, scope: &mut CaptureScope<'_>, page_ref: &PageRef) -> Result<Option<Page>, ProducerError>;

    /// Returns a human-readable name for this producer (for logging/debugging).
    fn name(&self) -> &'static str {
        "PageProducer"
    }
}

/// What a producer sees while producing one page.
///
/// The context is the clean one installed by the engine for this capture.
/// Nested captures issued through the scope get their own clean context and
/// leave this one untouched.
pub struct CaptureScope<'a> {
    capturer: &'a dyn Capturer,
    context: &'a mut CaptureContext,
}

impl<'a> CaptureScope<'a> {
    pub fn new(capturer: &'a dyn Capturer, context: &'a mut CaptureContext) -> Self {
        Self { capturer, context }
    }

    pub fn level(&self) -> CaptureLevel {
        self.context.level()
    }

    pub fn context(&self) -> &CaptureContext {
        self.context
    }

    pub fn context_mut(&mut self) -> &mut CaptureContext {
        self.context
    }

    pub fn books(&self) -> &dyn BookRegistry {
        self.capturer.books()
    }

    pub fn capturer(&self) -> &dyn Capturer {
        self.capturer
    }

    /// Captures another page from inside this production.
    pub fn capture(&mut self, page_ref: &PageRef, level: CaptureLevel) -> Result<Arc<Page>, CaptureError> {
        self.capturer.capture(self.context, page_ref, level)
    }

    pub fn capture_all(
        &self,
        page_refs: &[PageRef],
        level: CaptureLevel,
    ) -> Result<Vec<(PageRef, Arc<Page>)>, CaptureError> {
        self.capturer.capture_all(self.context, page_refs, level)
    }
}
