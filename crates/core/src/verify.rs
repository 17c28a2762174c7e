//! Parent/child edge verification.
//!
//! A parent/child edge may be declared from either endpoint. Both endpoints
//! must agree: when a page names a parent, that parent must name the page as
//! a child, and the other way round. Checks are one level deep. An edge is
//! checked when its second endpoint enters the cache, so the outcome does not
//! depend on capture order.

use crate::cache::{PageCache, UnverifiedEdges};
use crate::context::CaptureContext;
use crate::engine::Capturer;
use crate::error::CaptureError;
use crate::pages::filter_accessible;
use folio_traits::BookRegistry;
use folio_types::{CaptureLevel, Page};

/// Checks that `parent` lists `child` among its children.
pub fn verify_child_to_parent(child: &Page, parent: &Page) -> Result<(), CaptureError> {
    if parent.has_child(child.page_ref()) {
        Ok(())
    } else {
        Err(CaptureError::ParentMismatch {
            page: child.page_ref().clone(),
            parent: parent.page_ref().clone(),
        })
    }
}

/// Checks that `child` lists `parent` among its parents.
pub fn verify_parent_to_child(parent: &Page, child: &Page) -> Result<(), CaptureError> {
    if child.has_parent(parent.page_ref()) {
        Ok(())
    } else {
        Err(CaptureError::ChildMismatch {
            page: parent.page_ref().clone(),
            child: child.page_ref().clone(),
        })
    }
}

/// Verifies a page just added to `cache` against its neighbours.
///
/// Edges this page declares are checked against neighbours the cache already
/// holds at PAGE or META level. Edges towards neighbours not cached yet are
/// left in `unverified` and checked when that neighbour arrives. Edges that
/// cached pages declared towards this page while it was absent are checked
/// now. Neighbours in inaccessible books are skipped, and a page that allows
/// a mismatch never has its own declarations checked.
pub fn verify_added<C>(
    cache: &C,
    unverified: &mut UnverifiedEdges,
    books: &dyn BookRegistry,
    page: &Page,
) -> Result<(), CaptureError>
where
    C: PageCache + ?Sized,
{
    let page_ref = page.page_ref();
    for declaring in unverified.take_parent_claims(page_ref) {
        if !page.has_child(&declaring) {
            return Err(CaptureError::ParentMismatch {
                page: declaring,
                parent: page_ref.clone(),
            });
        }
    }
    for declaring in unverified.take_child_claims(page_ref) {
        if !page.has_parent(&declaring) {
            return Err(CaptureError::ChildMismatch {
                page: declaring,
                child: page_ref.clone(),
            });
        }
    }

    if !page.allow_parent_mismatch {
        for parent_ref in page.parent_refs() {
            if !books.is_page_accessible(parent_ref) {
                continue;
            }
            match cache.get_structure(parent_ref) {
                Some(parent) => verify_child_to_parent(page, &parent)?,
                None => unverified.claim_parent(parent_ref, page_ref),
            }
        }
    }
    if !page.allow_child_mismatch {
        for child_ref in page.children() {
            if !books.is_page_accessible(child_ref) {
                continue;
            }
            match cache.get_structure(child_ref) {
                Some(child) => verify_parent_to_child(page, &child)?,
                None => unverified.claim_child(child_ref, page_ref),
            }
        }
    }
    Ok(())
}

/// Verifies every edge of `page` by capturing its accessible neighbours at
/// PAGE level right now.
///
/// Used for pages that are never cached, such as BODY captures, where
/// cache-time verification never runs.
pub fn full_verify(capturer: &dyn Capturer, ctx: &CaptureContext, page: &Page) -> Result<(), CaptureError> {
    let books = capturer.books();
    if !page.allow_parent_mismatch {
        let parents = filter_accessible(books, page.parent_refs().cloned());
        for (_, parent) in capturer.capture_all(ctx, &parents, CaptureLevel::Page)? {
            verify_child_to_parent(page, &parent)?;
        }
    }
    if !page.allow_child_mismatch {
        let children = filter_accessible(books, page.children().iter().cloned());
        for (_, child) in capturer.capture_all(ctx, &children, CaptureLevel::Page)? {
            verify_parent_to_child(page, &child)?;
        }
    }
    Ok(())
}
