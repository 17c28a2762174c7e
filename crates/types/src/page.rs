//! The materialized result of a capture.

use crate::ids::ElementId;
use crate::page_ref::PageRef;
use std::fmt;

/// A parent declared by a page, with an optional per-parent short title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentRef {
    pub page_ref: PageRef,
    pub short_title: Option<String>,
}

impl ParentRef {
    pub fn new(page_ref: PageRef) -> Self {
        Self {
            page_ref,
            short_title: None,
        }
    }
}

/// An element on a page: a heading, a file, a definition and so on.
///
/// Elements form a tree under their page. Only META and BODY captures
/// carry elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    /// Free-form kind used by filters (e.g. `"file"`, `"heading"`).
    pub kind: String,
    pub label: String,
    pub hidden: bool,
    /// Pages this element links to.
    pub links: Vec<PageRef>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(id: impl Into<ElementId>, kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            label: label.into(),
            hidden: false,
            links: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn link(mut self, target: PageRef) -> Self {
        self.links.push(target);
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.children.push(element);
        self
    }

    /// Depth-first iteration over this element and all of its descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &Element> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// A materialized page at some capture level.
///
/// Pages are logically immutable once produced: the engine hands out shared
/// references and callers must not expect their own mutations to be seen by
/// anyone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    page_ref: PageRef,
    pub title: String,
    pub short_title: Option<String>,
    parents: Vec<ParentRef>,
    children: Vec<PageRef>,
    /// Suppresses verification of this page's declared parents.
    pub allow_parent_mismatch: bool,
    /// Suppresses verification of this page's declared children.
    pub allow_child_mismatch: bool,
    elements: Vec<Element>,
    /// Rendered content, only present on BODY captures.
    pub body: Option<String>,
}

impl Page {
    pub fn builder(page_ref: PageRef) -> PageBuilder {
        PageBuilder::new(page_ref)
    }

    pub fn page_ref(&self) -> &PageRef {
        &self.page_ref
    }

    pub fn parents(&self) -> &[ParentRef] {
        &self.parents
    }

    pub fn parent_refs(&self) -> impl Iterator<Item = &PageRef> {
        self.parents.iter().map(|p| &p.page_ref)
    }

    /// Declared children, in declaration order.
    pub fn children(&self) -> &[PageRef] {
        &self.children
    }

    pub fn has_parent(&self, page_ref: &PageRef) -> bool {
        self.parents.iter().any(|p| &p.page_ref == page_ref)
    }

    pub fn has_child(&self, page_ref: &PageRef) -> bool {
        self.children.contains(page_ref)
    }

    /// Top-level elements of the page.
    pub fn child_elements(&self) -> &[Element] {
        &self.elements
    }

    /// All elements of the page, depth-first.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().flat_map(Element::descendants)
    }

    pub fn find_element(&self, id: &ElementId) -> Option<&Element> {
        self.elements().find(|e| &e.id == id)
    }

    /// Returns this page without its elements and body, as a PAGE capture would see it.
    pub fn structure_only(&self) -> Page {
        Page {
            elements: Vec::new(),
            body: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.page_ref)
    }
}

/// Builder for [`Page`]. Declared parents and children are de-duplicated,
/// keeping the first occurrence.
#[derive(Debug, Clone)]
pub struct PageBuilder {
    page: Page,
}

impl PageBuilder {
    pub fn new(page_ref: PageRef) -> Self {
        let title = page_ref.path().to_string();
        Self {
            page: Page {
                page_ref,
                title,
                short_title: None,
                parents: Vec::new(),
                children: Vec::new(),
                allow_parent_mismatch: false,
                allow_child_mismatch: false,
                elements: Vec::new(),
                body: None,
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.page.title = title.into();
        self
    }

    pub fn short_title(mut self, short_title: impl Into<String>) -> Self {
        self.page.short_title = Some(short_title.into());
        self
    }

    pub fn parent(self, parent: PageRef) -> Self {
        self.parent_ref(ParentRef::new(parent))
    }

    pub fn parent_ref(mut self, parent: ParentRef) -> Self {
        if !self.page.has_parent(&parent.page_ref) {
            self.page.parents.push(parent);
        }
        self
    }

    pub fn child(mut self, child: PageRef) -> Self {
        if !self.page.children.contains(&child) {
            self.page.children.push(child);
        }
        self
    }

    pub fn allow_parent_mismatch(mut self, allow: bool) -> Self {
        self.page.allow_parent_mismatch = allow;
        self
    }

    pub fn allow_child_mismatch(mut self, allow: bool) -> Self {
        self.page.allow_child_mismatch = allow;
        self
    }

    pub fn element(mut self, element: Element) -> Self {
        self.page.elements.push(element);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.page.body = Some(body.into());
        self
    }

    pub fn build(self) -> Page {
        self.page
    }
}

/// A node in the navigation graph: either a page or an element on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRef {
    Page(PageRef),
    Element { page: PageRef, id: ElementId },
}

impl NodeRef {
    /// The page this node is, or belongs to.
    pub fn page_ref(&self) -> &PageRef {
        match self {
            NodeRef::Page(page) => page,
            NodeRef::Element { page, .. } => page,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Page(page) => write!(f, "{page}"),
            NodeRef::Element { page, id } => write!(f, "{page}#{id}"),
        }
    }
}
