//! Stable page identities: a book within a domain, and a path within that book.

use crate::ids::{BookPath, DomainName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifies a book: a namespace contributing pages to the overall graph.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BookRef {
    pub domain: DomainName,
    pub path: BookPath,
}

impl BookRef {
    pub fn new(domain: impl Into<DomainName>, path: impl Into<BookPath>) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for BookRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.path)
    }
}

/// The identity of a page: `(domain, book path, in-book path)`.
///
/// Page references are immutable and cheap to clone. They are created by the
/// routing layer, or by [`PageRef::resolve`] when following a relative link.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PageRef {
    pub book: BookRef,
    path: Arc<str>,
}

impl PageRef {
    /// Creates a reference to `path` within `book`.
    ///
    /// Paths are book-relative and begin with a slash; a missing leading
    /// slash is added.
    pub fn new(book: BookRef, path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        let path: Arc<str> = if path.starts_with('/') {
            path.into()
        } else {
            format!("/{path}").into()
        };
        Self { book, path }
    }

    /// The in-book path of this page.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn book_ref(&self) -> &BookRef {
        &self.book
    }

    /// Resolves `link` relative to this page, staying within the same book.
    ///
    /// Absolute links (`/a/b`) are taken from the book root. Relative links
    /// are resolved against this page's directory, with `.` and `..`
    /// segments collapsed. `..` never climbs above the book root.
    pub fn resolve(&self, link: &str) -> PageRef {
        let mut segments: Vec<&str> = Vec::new();
        if !link.starts_with('/') {
            // Directory of the current page
            let dir = match self.path.rfind('/') {
                Some(idx) => &self.path[..idx],
                None => "",
            };
            segments.extend(dir.split('/').filter(|s| !s.is_empty()));
        }
        for segment in link.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        let mut resolved = String::with_capacity(link.len() + self.path.len());
        for segment in &segments {
            resolved.push('/');
            resolved.push_str(segment);
        }
        if resolved.is_empty() || link.ends_with('/') {
            resolved.push('/');
        }
        PageRef::new(self.book.clone(), resolved)
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.book, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> BookRef {
        BookRef::new("example.com", "/docs")
    }

    #[test]
    fn test_leading_slash_is_added() {
        let page = PageRef::new(book(), "intro");
        assert_eq!(page.path(), "/intro");
    }

    #[test]
    fn test_equality_includes_book() {
        let a = PageRef::new(book(), "/index");
        let b = PageRef::new(BookRef::new("example.com", "/api"), "/index");
        assert_ne!(a, b);
        assert_eq!(a, PageRef::new(book(), "/index"));
    }

    #[test]
    fn test_display() {
        let page = PageRef::new(book(), "/guide/start");
        assert_eq!(page.to_string(), "example.com:/docs/guide/start");
    }

    #[test]
    fn test_resolve_sibling() {
        let page = PageRef::new(book(), "/guide/start");
        assert_eq!(page.resolve("next").path(), "/guide/next");
    }

    #[test]
    fn test_resolve_parent_directory() {
        let page = PageRef::new(book(), "/guide/deep/start");
        assert_eq!(page.resolve("../other").path(), "/guide/other");
        assert_eq!(page.resolve("./same").path(), "/guide/deep/same");
    }

    #[test]
    fn test_resolve_does_not_escape_book_root() {
        let page = PageRef::new(book(), "/start");
        assert_eq!(page.resolve("../../x").path(), "/x");
    }

    #[test]
    fn test_resolve_absolute_and_directory() {
        let page = PageRef::new(book(), "/guide/start");
        assert_eq!(page.resolve("/api/").path(), "/api/");
        assert_eq!(page.resolve("/").path(), "/");
        assert_eq!(page.resolve("/api/").book, book());
    }
}
