//! A site described in JSON and served from memory.
//!
//! [`InMemorySite`] stands in for the content-generation layer: it produces
//! pages from a [`SiteDefinition`] and answers which books are accessible.
//!
//! ```json
//! {
//!   "books": [{
//!     "domain": "example.com",
//!     "path": "/docs",
//!     "pages": [
//!       { "path": "/", "title": "Home", "children": ["/guide"] },
//!       { "path": "/guide", "title": "Guide", "parents": ["/"],
//!         "elements": [{ "id": "f1", "kind": "file", "label": "guide.pdf" }] }
//!     ]
//!   }]
//! }
//! ```
//!
//! References given as strings resolve against the declaring page within
//! its own book. References into another book name it explicitly:
//! `{ "domain": "example.com", "book": "/api", "path": "/" }`.

use crate::error::FolioError;
use folio_core::{
    BookRef, BookRegistry, CaptureLevel, CaptureScope, Element, InMemoryBookRegistry, Page, PageProducer, PageRef,
    ProducerError,
};
use folio_types::ParentRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDefinition {
    #[serde(default)]
    pub books: Vec<BookDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDefinition {
    pub domain: String,
    pub path: String,
    /// A book that is not accessible is known but never captured from.
    #[serde(default = "default_true")]
    pub accessible: bool,
    #[serde(default)]
    pub pages: Vec<PageDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageDefinition {
    pub path: String,
    pub title: String,
    pub short_title: Option<String>,
    pub parents: Vec<ParentDefinition>,
    pub children: Vec<RefDefinition>,
    pub allow_parent_mismatch: bool,
    pub allow_child_mismatch: bool,
    pub elements: Vec<ElementDefinition>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefDefinition {
    Local(String),
    Remote { domain: String, book: String, path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentDefinition {
    Plain(RefDefinition),
    Titled {
        page: RefDefinition,
        short_title: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDefinition {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub links: Vec<RefDefinition>,
    #[serde(default)]
    pub children: Vec<ElementDefinition>,
}

fn default_true() -> bool {
    true
}

impl RefDefinition {
    fn resolve(&self, from: &PageRef) -> PageRef {
        match self {
            RefDefinition::Local(link) => from.resolve(link),
            RefDefinition::Remote { domain, book, path } => {
                PageRef::new(BookRef::new(domain.as_str(), book.as_str()), path)
            }
        }
    }
}

impl ElementDefinition {
    fn to_element(&self, from: &PageRef) -> Element {
        let mut element = Element::new(self.id.as_str(), self.kind.as_str(), self.label.as_str()).hidden(self.hidden);
        for link in &self.links {
            element = element.link(link.resolve(from));
        }
        for child in &self.children {
            element = element.child(child.to_element(from));
        }
        element
    }
}

impl SiteDefinition {
    pub fn from_json(source: &str) -> Result<Self, FolioError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FolioError> {
        let path_ref = path.as_ref();
        let source = fs::read_to_string(path_ref).map_err(|e| {
            FolioError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read site from '{}': {}", path_ref.display(), e),
            ))
        })?;
        Self::from_json(&source)
    }
}

/// Serves the pages of a [`SiteDefinition`].
///
/// Each level sees a different amount of the page: PAGE only the structure,
/// META adds elements, BODY adds the body, followed by the titles of linked
/// pages, which are captured at META level while the body is produced.
#[derive(Debug)]
pub struct InMemorySite {
    pages: HashMap<PageRef, Page>,
    books: InMemoryBookRegistry,
    produced: AtomicUsize,
}

impl InMemorySite {
    /// Builds the site.
    ///
    /// # Errors
    ///
    /// [`FolioError::Site`] when a page path appears twice in one book or an
    /// element id twice on one page.
    pub fn new(definition: SiteDefinition) -> Result<Self, FolioError> {
        let mut pages = HashMap::new();
        let mut books = InMemoryBookRegistry::new();
        for book_def in &definition.books {
            let book = BookRef::new(book_def.domain.as_str(), book_def.path.as_str());
            books = if book_def.accessible {
                books.with_book(book.clone())
            } else {
                books.with_missing_book(book.clone())
            };
            for page_def in &book_def.pages {
                let page = build_page(&book, page_def)?;
                let page_ref = page.page_ref().clone();
                if pages.insert(page_ref.clone(), page).is_some() {
                    return Err(FolioError::Site(format!("duplicate page {page_ref}")));
                }
            }
        }
        log::info!("Loaded site with {} books and {} pages", books.len(), pages.len());
        Ok(Self {
            pages,
            books,
            produced: AtomicUsize::new(0),
        })
    }

    pub fn from_json(source: &str) -> Result<Self, FolioError> {
        Self::new(SiteDefinition::from_json(source)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FolioError> {
        Self::new(SiteDefinition::from_file(path)?)
    }

    /// The full page as defined, regardless of capture level.
    pub fn page(&self, page_ref: &PageRef) -> Option<&Page> {
        self.pages.get(page_ref)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// How many times any page has been produced.
    pub fn production_count(&self) -> usize {
        self.produced.load(Ordering::Acquire)
    }

    pub fn book_registry(&self) -> &InMemoryBookRegistry {
        &self.books
    }
}

fn build_page(book: &BookRef, def: &PageDefinition) -> Result<Page, FolioError> {
    let page_ref = PageRef::new(book.clone(), &def.path);
    let mut builder = Page::builder(page_ref.clone())
        .title(def.title.as_str())
        .allow_parent_mismatch(def.allow_parent_mismatch)
        .allow_child_mismatch(def.allow_child_mismatch);
    if let Some(short_title) = &def.short_title {
        builder = builder.short_title(short_title.as_str());
    }
    for parent in &def.parents {
        builder = match parent {
            ParentDefinition::Plain(target) => builder.parent(target.resolve(&page_ref)),
            ParentDefinition::Titled { page, short_title } => builder.parent_ref(ParentRef {
                page_ref: page.resolve(&page_ref),
                short_title: short_title.clone(),
            }),
        };
    }
    for child in &def.children {
        builder = builder.child(child.resolve(&page_ref));
    }
    for element_def in &def.elements {
        builder = builder.element(element_def.to_element(&page_ref));
    }
    if let Some(body) = &def.body {
        builder = builder.body(body.as_str());
    }
    let page = builder.build();

    let mut ids = std::collections::HashSet::new();
    if let Some(dup) = page.elements().find(|e| !ids.insert(e.id.clone())) {
        return Err(FolioError::Site(format!("duplicate element id '{}' on {}", dup.id, page_ref)));
    }
    Ok(page)
}

impl PageProducer for InMemorySite {
    fn produce(&self, scope: &mut CaptureScope<'_>, page_ref: &PageRef) -> Result<Option<Page>, ProducerError> {
        if !self.books.is_page_accessible(page_ref) {
            return Ok(None);
        }
        let Some(page) = self.pages.get(page_ref) else {
            return Ok(None);
        };
        self.produced.fetch_add(1, Ordering::AcqRel);
        log::trace!("Producing {} at {}", page_ref, scope.level());

        match scope.level() {
            CaptureLevel::Page => Ok(Some(page.structure_only())),
            CaptureLevel::Meta => {
                let mut meta = page.clone();
                meta.body = None;
                Ok(Some(meta))
            }
            CaptureLevel::Body => {
                let mut full = page.clone();
                let mut body = page.body.clone().unwrap_or_default();
                let links: Vec<PageRef> = page.elements().flat_map(|e| e.links.iter().cloned()).collect();
                for link in links {
                    if !self.books.is_page_accessible(&link) {
                        continue;
                    }
                    let target = scope.capture(&link, CaptureLevel::Meta)?;
                    let _ = write!(body, "\n-> {}", target.title);
                }
                full.body = Some(body);
                Ok(Some(full))
            }
        }
    }

    fn name(&self) -> &'static str {
        "InMemorySite"
    }
}

impl BookRegistry for InMemorySite {
    fn is_accessible(&self, book: &BookRef) -> bool {
        self.books.is_accessible(book)
    }

    fn name(&self) -> &'static str {
        "InMemorySite"
    }
}
