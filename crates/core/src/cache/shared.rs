use super::{Attribute, AttributeStore, PageCache, UnverifiedEdges};
use folio_types::{CaptureKey, Page};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// A page cache that concurrent sub-captures of one request may share.
///
/// Plain gets and puts only take the map's read or write lock for the
/// duration of the map operation. Edge verification, which reads several
/// keys and must see them together, runs under a separate per-instance mutex
/// so unrelated captures are never serialized behind it. The same mutex
/// guards the edges still waiting for their other endpoint.
///
/// Poisoned locks are recovered: every write leaves the maps consistent.
#[derive(Debug, Default)]
pub struct SharedCache {
    pages: RwLock<HashMap<CaptureKey, Arc<Page>>>,
    attributes: RwLock<HashMap<String, Attribute>>,
    verify_lock: Mutex<UnverifiedEdges>,
}

impl SharedCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttributeStore for SharedCache {
    fn attribute(&self, key: &str) -> Option<Attribute> {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn reconcile_attribute(&self, key: &str, value: Attribute) -> Attribute {
        let mut attributes = self.attributes.write().unwrap_or_else(PoisonError::into_inner);
        attributes.entry(key.to_string()).or_insert(value).clone()
    }

    fn remove_attribute(&self, key: &str) -> Option<Attribute> {
        self.attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

impl PageCache for SharedCache {
    fn get(&self, key: &CaptureKey) -> Option<Arc<Page>> {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: CaptureKey, page: Arc<Page>) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, page);
    }

    fn verify_with<R>(&self, check: impl FnOnce(&Self, &mut UnverifiedEdges) -> R) -> R {
        let mut unverified = self.verify_lock.lock().unwrap_or_else(PoisonError::into_inner);
        check(self, &mut unverified)
    }

    fn len(&self) -> usize {
        self.pages.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{BookRef, CaptureLevel, PageRef};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn key(i: usize) -> CaptureKey {
        let page_ref = PageRef::new(BookRef::new("example.com", "/docs"), format!("/p{i}"));
        CaptureKey::new(page_ref, CaptureLevel::Meta).unwrap()
    }

    #[test]
    fn test_concurrent_puts_are_all_visible() {
        let cache = Arc::new(SharedCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let k = key(i);
                    cache.put(k.clone(), Arc::new(Page::builder(k.page_ref().clone()).build()));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
        assert!((0..8).all(|i| cache.get(&key(i)).is_some()));
    }

    #[test]
    fn test_racing_computations_keep_one_value() {
        let cache = Arc::new(SharedCache::new());
        let computed = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let computed = Arc::clone(&computed);
                thread::spawn(move || {
                    let store: &dyn AttributeStore = &*cache;
                    let value = store
                        .get_or_compute("index", || {
                            computed.fetch_add(1, Ordering::SeqCst);
                            Ok(i)
                        })
                        .unwrap();
                    *value
                })
            })
            .collect();
        let seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(computed.load(Ordering::SeqCst) >= 1);
        assert!(seen.iter().all(|v| *v == seen[0]));
    }

    #[test]
    fn test_verification_is_serialized() {
        let cache = Arc::new(SharedCache::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    cache.verify_with(|_, _| {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
