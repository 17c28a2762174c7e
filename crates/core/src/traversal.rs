//! Graph traversals over captured pages.
//!
//! The main entry point is [`find_matches`], the reachability filter used to
//! prune a navigation tree down to the branches that lead to a matching
//! element. [`prune`] turns its result into the tree a renderer would emit.
//! Children are captured lazily through the request, so a page reached along
//! several paths is produced once.

use crate::context::CaptureContext;
use crate::engine::Capturer;
use crate::error::CaptureError;
use crate::pages::filter_accessible;
use folio_types::{CaptureLevel, Element, NodeRef, Page, PageRef};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// A predicate over page elements.
pub trait ElementFilter {
    fn matches(&self, element: &Element) -> bool;
}

impl<F> ElementFilter for F
where
    F: Fn(&Element) -> bool,
{
    fn matches(&self, element: &Element) -> bool {
        self(element)
    }
}

/// Matches visible elements of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindFilter {
    kind: String,
}

impl KindFilter {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

impl ElementFilter for KindFilter {
    fn matches(&self, element: &Element) -> bool {
        !element.hidden && element.kind == self.kind
    }
}

/// Matches elements linking to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinksTo(pub PageRef);

impl ElementFilter for LinksTo {
    fn matches(&self, element: &Element) -> bool {
        element.links.contains(&self.0)
    }
}

/// Finds every node that matches `filter` or has a matching descendant.
///
/// Descends into child pages captured at META level, skipping children in
/// inaccessible books. With `include_elements`, elements are nodes of their
/// own and are reported individually; without it, any matching element
/// counts as a match of the page it is on.
///
/// Cyclic parent/child declarations terminate. Pages on a common cycle reach
/// the same descendants, so they match or fail together regardless of which
/// one the search entered first. An element root missing from its page
/// yields an empty set.
pub fn find_matches(
    capturer: &dyn Capturer,
    ctx: &mut CaptureContext,
    filter: &dyn ElementFilter,
    root: &NodeRef,
    include_elements: bool,
) -> Result<HashSet<NodeRef>, CaptureError> {
    let page = capturer.capture(ctx, root.page_ref(), CaptureLevel::Meta)?;
    let mut search = MatchSearch {
        capturer,
        ctx,
        filter,
        include_elements,
        matches: HashSet::new(),
        next_index: 0,
        open: HashMap::new(),
        stack: Vec::new(),
        finished: HashMap::new(),
    };
    match root {
        NodeRef::Page(_) => {
            search.visit_page(&page)?;
        }
        NodeRef::Element { id, .. } => {
            if let Some(element) = page.find_element(id) {
                search.visit_element(page.page_ref(), element);
            }
        }
    }
    Ok(search.matches)
}

/// Outcome of visiting a page during a [`MatchSearch`].
enum Visit {
    /// The page and its whole cycle are settled.
    Finished(bool),
    /// The page sits on a cycle still being searched; carries the lowest
    /// open index it reaches.
    Open(usize),
}

/// Depth-first search that settles cycles as strongly connected components,
/// so a page's result never depends on the path it was entered from.
struct MatchSearch<'a> {
    capturer: &'a dyn Capturer,
    ctx: &'a mut CaptureContext,
    filter: &'a dyn ElementFilter,
    include_elements: bool,
    matches: HashSet<NodeRef>,
    next_index: usize,
    open: HashMap<PageRef, usize>,
    stack: Vec<(PageRef, bool)>,
    finished: HashMap<PageRef, bool>,
}

impl MatchSearch<'_> {
    fn visit_page(&mut self, page: &Page) -> Result<Visit, CaptureError> {
        let page_ref = page.page_ref();
        if let Some(&found) = self.finished.get(page_ref) {
            return Ok(Visit::Finished(found));
        }
        if let Some(&index) = self.open.get(page_ref) {
            return Ok(Visit::Open(index));
        }

        let index = self.next_index;
        self.next_index += 1;
        self.open.insert(page_ref.clone(), index);
        let position = self.stack.len();
        self.stack.push((page_ref.clone(), false));
        let mut low = index;

        let mut has_match = page.child_elements().iter().any(|e| self.filter.matches(e));
        if self.include_elements {
            for element in page.child_elements() {
                has_match |= self.visit_element(page_ref, element);
            }
        } else if !has_match {
            has_match = page.elements().any(|e| self.filter.matches(e));
        }

        for child_ref in filter_accessible(self.capturer.books(), page.children().iter().cloned()) {
            let child = self.capturer.capture(self.ctx, &child_ref, CaptureLevel::Meta)?;
            match self.visit_page(&child)? {
                Visit::Finished(found) => has_match |= found,
                Visit::Open(child_low) => low = low.min(child_low),
            }
        }
        self.stack[position].1 = has_match;

        if low < index {
            return Ok(Visit::Open(low));
        }

        let component = self.stack.split_off(position);
        let found = component.iter().any(|(_, m)| *m);
        for (member, _) in component {
            self.open.remove(&member);
            if found {
                self.matches.insert(NodeRef::Page(member.clone()));
            }
            self.finished.insert(member, found);
        }
        Ok(Visit::Finished(found))
    }

    fn visit_element(&mut self, page_ref: &PageRef, element: &Element) -> bool {
        let mut has_match =
            self.filter.matches(element) || element.children.iter().any(|e| self.filter.matches(e));
        for child in &element.children {
            has_match |= self.visit_element(page_ref, child);
        }
        if has_match {
            self.matches.insert(NodeRef::Element {
                page: page_ref.clone(),
                id: element.id.clone(),
            });
        }
        has_match
    }
}

/// The direct children of `node` as a navigation tree shows them: visible
/// child elements first when `include_elements`, then child pages in
/// accessible books.
pub fn child_nodes(
    capturer: &dyn Capturer,
    ctx: &mut CaptureContext,
    node: &NodeRef,
    include_elements: bool,
) -> Result<Vec<NodeRef>, CaptureError> {
    let page = capturer.capture(ctx, node.page_ref(), CaptureLevel::Meta)?;
    let mut children = Vec::new();
    let elements = match node {
        NodeRef::Page(_) => page.child_elements(),
        NodeRef::Element { id, .. } => match page.find_element(id) {
            Some(element) => element.children.as_slice(),
            None => return Ok(children),
        },
    };
    if include_elements {
        children.extend(elements.iter().filter(|e| !e.hidden).map(|e| NodeRef::Element {
            page: page.page_ref().clone(),
            id: e.id.clone(),
        }));
    }
    if let NodeRef::Page(_) = node {
        children.extend(
            filter_accessible(capturer.books(), page.children().iter().cloned())
                .into_iter()
                .map(NodeRef::Page),
        );
    }
    Ok(children)
}

/// A navigation tree reduced to the branches leading to a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredTree {
    pub node: NodeRef,
    pub label: String,
    pub children: Vec<FilteredTree>,
}

impl FilteredTree {
    /// Number of nodes in the tree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(FilteredTree::node_count).sum::<usize>()
    }

    /// Depth-first iteration over every node in the tree.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRef> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(&next.node)
        })
    }
}

/// Builds the tree under `root` keeping only nodes in `matches`.
///
/// Returns `None` when `root` itself is not kept. A node already on the
/// current path is not expanded again.
pub fn prune(
    capturer: &dyn Capturer,
    ctx: &mut CaptureContext,
    matches: &HashSet<NodeRef>,
    root: &NodeRef,
    include_elements: bool,
) -> Result<Option<FilteredTree>, CaptureError> {
    let mut path = HashSet::new();
    prune_node(capturer, ctx, matches, root, include_elements, &mut path)
}

fn prune_node(
    capturer: &dyn Capturer,
    ctx: &mut CaptureContext,
    matches: &HashSet<NodeRef>,
    node: &NodeRef,
    include_elements: bool,
    path: &mut HashSet<NodeRef>,
) -> Result<Option<FilteredTree>, CaptureError> {
    if !matches.contains(node) || !path.insert(node.clone()) {
        return Ok(None);
    }
    let label = label_of(capturer, ctx, node)?;
    let mut children = Vec::new();
    for child in child_nodes(capturer, ctx, node, include_elements)? {
        if let Some(tree) = prune_node(capturer, ctx, matches, &child, include_elements, path)? {
            children.push(tree);
        }
    }
    path.remove(node);
    Ok(Some(FilteredTree {
        node: node.clone(),
        label,
        children,
    }))
}

fn label_of(capturer: &dyn Capturer, ctx: &mut CaptureContext, node: &NodeRef) -> Result<String, CaptureError> {
    let page = capturer.capture(ctx, node.page_ref(), CaptureLevel::Meta)?;
    Ok(match node {
        NodeRef::Page(_) => page.title.clone(),
        NodeRef::Element { id, .. } => page
            .find_element(id)
            .map(|e| e.label.clone())
            .unwrap_or_else(|| id.to_string()),
    })
}

/// Visits pages reachable from `root` through declared children, breadth
/// first, capturing each frontier as one batch. Stops at the first page for
/// which `visit` returns `Some`.
///
/// Every reachable page in an accessible book is visited at most once; the
/// order among pages of one frontier is unspecified.
pub fn traverse_any_order<T>(
    capturer: &dyn Capturer,
    ctx: &CaptureContext,
    root: &PageRef,
    level: CaptureLevel,
    mut visit: impl FnMut(&Page) -> Option<T>,
) -> Result<Option<T>, CaptureError> {
    let mut seen: HashSet<PageRef> = HashSet::from([root.clone()]);
    let mut frontier: VecDeque<PageRef> = VecDeque::from([root.clone()]);
    while !frontier.is_empty() {
        let batch: Vec<PageRef> = frontier.drain(..).collect();
        let captured: Vec<(PageRef, Arc<Page>)> = capturer.capture_all(ctx, &batch, level)?;
        for (_, page) in &captured {
            if let Some(found) = visit(page.as_ref()) {
                return Ok(Some(found));
            }
        }
        for (_, page) in captured {
            for child in filter_accessible(capturer.books(), page.children().iter().cloned()) {
                if seen.insert(child.clone()) {
                    frontier.push_back(child);
                }
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_filter_skips_hidden() {
        let filter = KindFilter::new("file");
        assert!(filter.matches(&Element::new("a", "file", "A")));
        assert!(!filter.matches(&Element::new("b", "file", "B").hidden(true)));
        assert!(!filter.matches(&Element::new("c", "heading", "C")));
    }

    #[test]
    fn test_closures_are_filters() {
        let filter = |e: &Element| e.label.starts_with("Intro");
        assert!(filter.matches(&Element::new("a", "heading", "Introduction")));
        assert!(!filter.matches(&Element::new("b", "heading", "Summary")));
    }

    #[test]
    fn test_filtered_tree_nodes_preorder() {
        let node = |path: &str| {
            NodeRef::Page(PageRef::new(folio_types::BookRef::new("example.com", "/docs"), path))
        };
        let tree = FilteredTree {
            node: node("/"),
            label: "Root".into(),
            children: vec![
                FilteredTree {
                    node: node("/a"),
                    label: "A".into(),
                    children: vec![FilteredTree {
                        node: node("/a/leaf"),
                        label: "Leaf".into(),
                        children: vec![],
                    }],
                },
                FilteredTree {
                    node: node("/b"),
                    label: "B".into(),
                    children: vec![],
                },
            ],
        };
        let order: Vec<_> = tree.nodes().map(|n| n.page_ref().path().to_string()).collect();
        assert_eq!(order, vec!["/", "/a", "/a/leaf", "/b"]);
        assert_eq!(tree.node_count(), 4);
    }
}
