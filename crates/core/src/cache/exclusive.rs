use super::{Attribute, AttributeStore, PageCache, UnverifiedEdges};
use folio_types::{CaptureKey, Page};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// A page cache for requests that never capture in parallel.
///
/// Backed by plain hash maps. The `RefCell`s make this type `!Sync`, so it
/// cannot be shared between threads at all; it can still be moved, which the
/// owner-thread check catches in debug builds.
#[derive(Debug)]
pub struct ExclusiveCache {
    pages: RefCell<HashMap<CaptureKey, Arc<Page>>>,
    attributes: RefCell<HashMap<String, Attribute>>,
    unverified: RefCell<UnverifiedEdges>,
    owner: ThreadId,
}

impl ExclusiveCache {
    pub fn new() -> Self {
        Self {
            pages: RefCell::new(HashMap::new()),
            attributes: RefCell::new(HashMap::new()),
            unverified: RefCell::new(UnverifiedEdges::default()),
            owner: thread::current().id(),
        }
    }

    #[inline]
    fn assert_owner(&self) {
        debug_assert_eq!(
            self.owner,
            thread::current().id(),
            "ExclusiveCache used from a thread other than the one that created it"
        );
    }
}

impl Default for ExclusiveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeStore for ExclusiveCache {
    fn attribute(&self, key: &str) -> Option<Attribute> {
        self.assert_owner();
        self.attributes.borrow().get(key).cloned()
    }

    fn reconcile_attribute(&self, key: &str, value: Attribute) -> Attribute {
        self.assert_owner();
        self.attributes
            .borrow_mut()
            .entry(key.to_string())
            .or_insert(value)
            .clone()
    }

    fn remove_attribute(&self, key: &str) -> Option<Attribute> {
        self.assert_owner();
        self.attributes.borrow_mut().remove(key)
    }
}

impl PageCache for ExclusiveCache {
    fn get(&self, key: &CaptureKey) -> Option<Arc<Page>> {
        self.assert_owner();
        self.pages.borrow().get(key).cloned()
    }

    fn put(&self, key: CaptureKey, page: Arc<Page>) {
        self.assert_owner();
        self.pages.borrow_mut().insert(key, page);
    }

    fn verify_with<R>(&self, check: impl FnOnce(&Self, &mut UnverifiedEdges) -> R) -> R {
        self.assert_owner();
        let mut unverified = self.unverified.borrow_mut();
        check(self, &mut unverified)
    }

    fn len(&self) -> usize {
        self.pages.borrow().len()
    }
}
