//! Sequential numbering of the pages under a root.
//!
//! When several pages are rendered together, links between them point at
//! their position in the combined output instead of at separate documents.
//! The index is computed at most once per request and root.

use crate::context::CaptureContext;
use crate::engine::Capturer;
use crate::error::CaptureError;
use crate::pages::filter_accessible;
use folio_types::{CaptureLevel, PageRef};
use std::collections::HashMap;
use std::sync::Arc;

/// Pages reachable from a root, in depth-first pre-order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIndex {
    root: PageRef,
    pages: Vec<PageRef>,
    positions: HashMap<PageRef, usize>,
}

impl PageIndex {
    /// Walks the tree under `root` at PAGE level.
    ///
    /// Children in inaccessible books are left out. A page reachable along
    /// several paths is numbered where it is first reached.
    pub fn build(capturer: &dyn Capturer, ctx: &mut CaptureContext, root: &PageRef) -> Result<Self, CaptureError> {
        let mut index = PageIndex {
            root: root.clone(),
            pages: Vec::new(),
            positions: HashMap::new(),
        };
        let mut stack = vec![root.clone()];
        while let Some(page_ref) = stack.pop() {
            if index.positions.contains_key(&page_ref) {
                continue;
            }
            let page = capturer.capture(ctx, &page_ref, CaptureLevel::Page)?;
            index.positions.insert(page_ref.clone(), index.pages.len());
            index.pages.push(page_ref);
            let children = filter_accessible(capturer.books(), page.children().iter().cloned());
            stack.extend(children.into_iter().rev());
        }
        Ok(index)
    }

    /// The index for `root`, computed on first use within the request.
    pub fn for_request(
        capturer: &dyn Capturer,
        ctx: &mut CaptureContext,
        root: &PageRef,
    ) -> Result<Arc<Self>, CaptureError> {
        let key = format!("folio.page_index:{root}");
        capturer
            .attributes()
            .get_or_compute(&key, || Self::build(capturer, ctx, root))
    }

    pub fn root(&self) -> &PageRef {
        &self.root
    }

    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }

    pub fn index_of(&self, page_ref: &PageRef) -> Option<usize> {
        self.positions.get(page_ref).copied()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
