//! Small helpers over captured pages.

use crate::context::CaptureContext;
use crate::engine::Capturer;
use crate::error::CaptureError;
use crate::traversal::{ElementFilter, traverse_any_order};
use folio_traits::BookRegistry;
use folio_types::{CaptureLevel, Page, PageRef};
use std::collections::HashSet;

/// Keeps the references whose book is accessible, dropping duplicates and
/// preserving order.
pub fn filter_accessible(books: &dyn BookRegistry, page_refs: impl IntoIterator<Item = PageRef>) -> Vec<PageRef> {
    let mut seen = HashSet::new();
    page_refs
        .into_iter()
        .filter(|page_ref| books.is_page_accessible(page_ref))
        .filter(|page_ref| seen.insert(page_ref.clone()))
        .collect()
}

/// Whether `page` has at least one child in an accessible book.
pub fn has_child(books: &dyn BookRegistry, page: &Page) -> bool {
    page.children().iter().any(|child| books.is_page_accessible(child))
}

/// Whether `page`, or with `recursive` any page below it in an accessible
/// book, has an element matching `filter`.
pub fn has_element(
    capturer: &dyn Capturer,
    ctx: &CaptureContext,
    page: &Page,
    filter: &dyn ElementFilter,
    recursive: bool,
) -> Result<bool, CaptureError> {
    if !recursive {
        return Ok(page.elements().any(|e| filter.matches(e)));
    }
    let found = traverse_any_order(capturer, ctx, page.page_ref(), CaptureLevel::Meta, |visited| {
        visited.elements().any(|e| filter.matches(e)).then_some(())
    })?;
    Ok(found.is_some())
}

/// The short title of `page` as shown under `parent`.
///
/// A short title declared for that specific parent wins, then the page's own
/// short title, then its title.
pub fn short_title<'p>(parent: Option<&PageRef>, page: &'p Page) -> &'p str {
    parent
        .and_then(|parent| page.parents().iter().find(|p| &p.page_ref == parent))
        .and_then(|p| p.short_title.as_deref())
        .or(page.short_title.as_deref())
        .unwrap_or(&page.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_traits::InMemoryBookRegistry;
    use folio_types::{BookRef, ParentRef};

    fn docs() -> BookRef {
        BookRef::new("example.com", "/docs")
    }

    fn missing() -> BookRef {
        BookRef::new("example.com", "/missing")
    }

    fn books() -> InMemoryBookRegistry {
        InMemoryBookRegistry::new().with_book(docs()).with_missing_book(missing())
    }

    #[test]
    fn test_filter_accessible_keeps_order_and_drops_duplicates() {
        let refs = vec![
            PageRef::new(docs(), "/b"),
            PageRef::new(missing(), "/x"),
            PageRef::new(docs(), "/a"),
            PageRef::new(docs(), "/b"),
            PageRef::new(BookRef::new("other.org", "/"), "/unknown"),
        ];
        let kept = filter_accessible(&books(), refs);
        assert_eq!(kept, vec![PageRef::new(docs(), "/b"), PageRef::new(docs(), "/a")]);
    }

    #[test]
    fn test_has_child_ignores_missing_books() {
        let only_missing = Page::builder(PageRef::new(docs(), "/"))
            .child(PageRef::new(missing(), "/x"))
            .build();
        let mixed = Page::builder(PageRef::new(docs(), "/"))
            .child(PageRef::new(missing(), "/x"))
            .child(PageRef::new(docs(), "/a"))
            .build();
        assert!(!has_child(&books(), &only_missing));
        assert!(has_child(&books(), &mixed));
    }

    #[test]
    fn test_short_title_precedence() {
        let root = PageRef::new(docs(), "/");
        let other = PageRef::new(docs(), "/other");
        let page = Page::builder(PageRef::new(docs(), "/a"))
            .title("Alpha Section")
            .parent_ref(ParentRef {
                page_ref: root.clone(),
                short_title: Some("Alpha".into()),
            })
            .parent(other.clone())
            .build();
        assert_eq!(short_title(Some(&root), &page), "Alpha");
        assert_eq!(short_title(Some(&other), &page), "Alpha Section");
        assert_eq!(short_title(None, &page), "Alpha Section");

        let with_short = Page::builder(PageRef::new(docs(), "/b"))
            .title("Beta Section")
            .short_title("Beta")
            .build();
        assert_eq!(short_title(None, &with_short), "Beta");
    }
}
