use crate::page_ref::PageRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The depth of detail requested from a capture.
///
/// Levels are ordered: `Page < Meta < Body`. A capture at a given level
/// contains everything the lower levels contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureLevel {
    /// Identity and structure only (parents, children, titles).
    Page,
    /// Structure plus element and link metadata, enough for cross-page indexing.
    Meta,
    /// Full renderable content. Never cached.
    Body,
}

impl CaptureLevel {
    /// Whether results captured at this level may be retained in a request cache.
    pub fn is_cacheable(self) -> bool {
        self != CaptureLevel::Body
    }

    /// Whether this level is at least as detailed as `other`.
    pub fn includes(self, other: CaptureLevel) -> bool {
        self >= other
    }
}

impl fmt::Display for CaptureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureLevel::Page => "PAGE",
            CaptureLevel::Meta => "META",
            CaptureLevel::Body => "BODY",
        };
        f.write_str(name)
    }
}

/// The cache key for a capture: a page reference at a cacheable level.
///
/// No key exists for [`CaptureLevel::Body`]; body captures are always
/// produced fresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptureKey {
    page_ref: PageRef,
    level: CaptureLevel,
}

impl CaptureKey {
    /// Returns `None` for body-level captures.
    pub fn new(page_ref: PageRef, level: CaptureLevel) -> Option<Self> {
        level.is_cacheable().then_some(Self { page_ref, level })
    }

    pub fn page_ref(&self) -> &PageRef {
        &self.page_ref
    }

    pub fn level(&self) -> CaptureLevel {
        self.level
    }
}

impl fmt::Display for CaptureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.level, self.page_ref)
    }
}
