//! The ambient capture context.
//!
//! Producers may recursively capture other pages while producing their own.
//! Each nested capture must start from a clean context: it must not see the
//! current node or current page of the capture that triggered it. The engine
//! swaps the context out with a [`ContextGuard`] for the duration of the
//! nested production and puts the previous one back when the guard drops,
//! whether production succeeded, failed or panicked.

use folio_types::{CaptureLevel, NodeRef, PageRef};
use std::ops::{Deref, DerefMut};

/// The caller-scoped state visible to a producer during capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureContext {
    /// The node currently being produced, if any.
    pub current_node: Option<NodeRef>,
    /// The page currently being produced, if any.
    pub current_page: Option<PageRef>,
    /// The level of the capture in progress; `None` outside of any capture.
    pub capture_level: Option<CaptureLevel>,
}

impl CaptureContext {
    /// A context for a top-level processing unit, outside of any capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean context for a capture at `level`.
    pub fn for_capture(level: CaptureLevel) -> Self {
        Self {
            current_node: None,
            current_page: None,
            capture_level: Some(level),
        }
    }

    /// The effective level: outside of any capture, everything is rendered.
    pub fn level(&self) -> CaptureLevel {
        self.capture_level.unwrap_or(CaptureLevel::Body)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_level.is_some()
    }
}

/// Borrows a context slot, replacing its contents until dropped.
pub struct ContextGuard<'a> {
    slot: &'a mut CaptureContext,
    saved: Option<CaptureContext>,
}

impl<'a> ContextGuard<'a> {
    /// Saves the current contents of `slot` and installs `replacement`.
    pub fn swap(slot: &'a mut CaptureContext, replacement: CaptureContext) -> Self {
        let saved = std::mem::replace(slot, replacement);
        Self {
            slot,
            saved: Some(saved),
        }
    }
}

impl Deref for ContextGuard<'_> {
    type Target = CaptureContext;

    fn deref(&self) -> &CaptureContext {
        self.slot
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut CaptureContext {
        self.slot
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.slot = saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::BookRef;

    fn outer_context() -> CaptureContext {
        let page = PageRef::new(BookRef::new("example.com", "/docs"), "/outer");
        CaptureContext {
            current_node: Some(NodeRef::Page(page.clone())),
            current_page: Some(page),
            capture_level: Some(CaptureLevel::Body),
        }
    }

    #[test]
    fn test_guard_clears_and_restores() {
        let mut ctx = outer_context();
        {
            let guard = ContextGuard::swap(&mut ctx, CaptureContext::for_capture(CaptureLevel::Meta));
            assert!(guard.current_node.is_none());
            assert!(guard.current_page.is_none());
            assert_eq!(guard.level(), CaptureLevel::Meta);
        }
        assert_eq!(ctx, outer_context());
    }

    #[test]
    fn test_guard_restores_after_panic() {
        let mut ctx = outer_context();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut guard = ContextGuard::swap(&mut ctx, CaptureContext::for_capture(CaptureLevel::Page));
            guard.current_page = None;
            panic!("producer blew up");
        }));
        assert!(result.is_err());
        assert_eq!(ctx, outer_context());
    }

    #[test]
    fn test_top_level_context_renders_everything() {
        let ctx = CaptureContext::new();
        assert!(!ctx.is_capturing());
        assert_eq!(ctx.level(), CaptureLevel::Body);
    }
}
