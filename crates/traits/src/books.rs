//! BookRegistry trait for asking whether a book can be captured from.
//!
//! Edge verification never looks at pages in books that are missing or
//! otherwise inaccessible, so the engine only needs this one question answered.

use folio_types::{BookRef, PageRef};
use std::collections::HashMap;
use std::fmt::Debug;

/// Answers whether a given book is reachable.
///
/// An accessible book can have its pages captured and is fully connected
/// into the page graph. Unknown books are inaccessible.
pub trait BookRegistry: Send + Sync + Debug {
    fn is_accessible(&self, book: &BookRef) -> bool;

    /// Convenience for checking the book of a page reference.
    fn is_page_accessible(&self, page_ref: &PageRef) -> bool {
        self.is_accessible(page_ref.book_ref())
    }

    /// Returns a human-readable name for this registry (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// A fixed table of books, built once at startup.
///
/// Books may be registered as missing: they are known (pages may point into
/// them) but never captured from.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBookRegistry {
    books: HashMap<BookRef, bool>,
}

impl InMemoryBookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an accessible book.
    pub fn with_book(mut self, book: BookRef) -> Self {
        self.books.insert(book, true);
        self
    }

    /// Registers a known but inaccessible book.
    pub fn with_missing_book(mut self, book: BookRef) -> Self {
        self.books.insert(book, false);
        self
    }

    pub fn is_known(&self, book: &BookRef) -> bool {
        self.books.contains_key(book)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl FromIterator<(BookRef, bool)> for InMemoryBookRegistry {
    fn from_iter<I: IntoIterator<Item = (BookRef, bool)>>(iter: I) -> Self {
        Self {
            books: iter.into_iter().collect(),
        }
    }
}

impl BookRegistry for InMemoryBookRegistry {
    fn is_accessible(&self, book: &BookRef) -> bool {
        self.books.get(book).copied().unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryBookRegistry"
    }
}
