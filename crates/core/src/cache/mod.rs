//! Per-request page caches.
//!
//! A request cache maps `(page, level)` to the page captured at that level,
//! for PAGE and META captures only. It also holds a small attribute store for
//! incidental values computed once per request, such as a page index.
//!
//! Two strategies exist:
//!
//! - [`ExclusiveCache`]: plain hash maps behind `RefCell`. The type is `!Sync`,
//!   so a request using it can never fan captures out across threads.
//! - [`SharedCache`]: lock-protected maps that parallel sub-captures may share.
//!   Edge verification is serialized per cache instance.
//!
//! Both keep the [`UnverifiedEdges`] declared towards pages that are not
//! cached yet, so an edge is checked whichever endpoint arrives second.

mod exclusive;
mod shared;

pub use exclusive::ExclusiveCache;
pub use shared::SharedCache;

use crate::error::CaptureError;
use folio_types::{CaptureKey, CaptureLevel, Page, PageRef};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A type-erased, shareable attribute value.
pub type Attribute = Arc<dyn Any + Send + Sync>;

/// Request-scoped memo storage for incidental values.
pub trait AttributeStore {
    fn attribute(&self, key: &str) -> Option<Attribute>;

    /// Stores `value` under `key` unless a value is already present, and
    /// returns whichever value is retained.
    fn reconcile_attribute(&self, key: &str, value: Attribute) -> Attribute;

    fn remove_attribute(&self, key: &str) -> Option<Attribute>;
}

impl dyn AttributeStore + '_ {
    /// Gets the attribute under `key`, computing it when absent.
    ///
    /// The computation runs without any lock held, so it may itself capture
    /// pages. When two threads race on the same key both may compute, but only
    /// the first stored value is kept and returned to both.
    pub fn get_or_compute<V, F>(&self, key: &str, compute: F) -> Result<Arc<V>, CaptureError>
    where
        V: Any + Send + Sync,
        F: FnOnce() -> Result<V, CaptureError>,
    {
        let attribute = match self.attribute(key) {
            Some(existing) => existing,
            None => {
                let computed: Attribute = Arc::new(compute()?);
                self.reconcile_attribute(key, computed)
            }
        };
        attribute
            .downcast::<V>()
            .map_err(|_| CaptureError::AttributeType {
                key: key.to_string(),
            })
    }
}

/// A page cache scoped to exactly one request.
///
/// Callers never pass BODY keys: [`CaptureKey`] cannot be formed for them.
pub trait PageCache: AttributeStore + Debug {
    fn get(&self, key: &CaptureKey) -> Option<Arc<Page>>;

    fn put(&self, key: CaptureKey, page: Arc<Page>);

    /// Runs an edge check with whatever exclusion this strategy requires, so
    /// the check observes a consistent view across several keys together
    /// with the edges still waiting for their other endpoint.
    fn verify_with<R>(&self, check: impl FnOnce(&Self, &mut UnverifiedEdges) -> R) -> R
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds `page_ref` at PAGE level, then at META level.
    fn get_structure(&self, page_ref: &PageRef) -> Option<Arc<Page>> {
        [CaptureLevel::Page, CaptureLevel::Meta]
            .into_iter()
            .filter_map(|level| CaptureKey::new(page_ref.clone(), level))
            .find_map(|key| self.get(&key))
    }
}

/// Edges declared by cached pages towards pages not cached yet.
///
/// Each claim is checked once, by the capture that brings the target into the
/// cache. Claims from pages that allow the mismatch are never recorded.
#[derive(Debug, Default)]
pub struct UnverifiedEdges {
    // target -> pages naming it as their parent
    parent_claims: HashMap<PageRef, Vec<PageRef>>,
    // target -> pages naming it as their child
    child_claims: HashMap<PageRef, Vec<PageRef>>,
}

impl UnverifiedEdges {
    /// Records that `declaring` names `parent` as one of its parents.
    pub fn claim_parent(&mut self, parent: &PageRef, declaring: &PageRef) {
        push_unique(self.parent_claims.entry(parent.clone()).or_default(), declaring);
    }

    /// Records that `declaring` names `child` as one of its children.
    pub fn claim_child(&mut self, child: &PageRef, declaring: &PageRef) {
        push_unique(self.child_claims.entry(child.clone()).or_default(), declaring);
    }

    /// Removes and returns the pages that named `target` as their parent.
    pub fn take_parent_claims(&mut self, target: &PageRef) -> Vec<PageRef> {
        self.parent_claims.remove(target).unwrap_or_default()
    }

    /// Removes and returns the pages that named `target` as their child.
    pub fn take_child_claims(&mut self, target: &PageRef) -> Vec<PageRef> {
        self.child_claims.remove(target).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.parent_claims.is_empty() && self.child_claims.is_empty()
    }
}

fn push_unique(claims: &mut Vec<PageRef>, declaring: &PageRef) {
    if !claims.contains(declaring) {
        claims.push(declaring.clone());
    }
}
