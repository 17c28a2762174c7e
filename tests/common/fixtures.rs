use serde_json::{Value, json};

/// Wraps page definitions into a site with the fixture book and a missing
/// `/archive` book.
pub fn site_with(pages: Value) -> Value {
    json!({
        "books": [
            { "domain": "example.com", "path": "/docs", "pages": pages },
            { "domain": "example.com", "path": "/archive", "accessible": false }
        ]
    })
}

/// root -> {A, B}, A -> leaf. Only the leaf carries a file element.
pub fn scenario_site() -> Value {
    site_with(json!([
        { "path": "/", "title": "Root", "children": ["/a", "/b"] },
        { "path": "/a", "title": "Child A", "parents": ["/"], "children": ["/a/leaf"] },
        { "path": "/b", "title": "Child B", "parents": ["/"],
          "elements": [{ "id": "h1", "kind": "heading", "label": "Overview" }] },
        { "path": "/a/leaf", "title": "Leaf", "parents": ["/a"],
          "elements": [{ "id": "report", "kind": "file", "label": "report.pdf", "links": ["/b"] }] }
    ]))
}

/// root -> {A, B}, A -> shared, B -> shared.
pub fn diamond_site() -> Value {
    site_with(json!([
        { "path": "/", "title": "Root", "children": ["/a", "/b"] },
        { "path": "/a", "title": "A", "parents": ["/"], "children": ["/shared"] },
        { "path": "/b", "title": "B", "parents": ["/"], "children": ["/shared"] },
        { "path": "/shared", "title": "Shared", "parents": ["/a", "/b"],
          "elements": [{ "id": "f", "kind": "file", "label": "shared.zip" }] }
    ]))
}

/// root -> x, x -> y, y -> x. The file lives on y.
pub fn cyclic_site() -> Value {
    site_with(json!([
        { "path": "/", "title": "Root", "children": ["/x"] },
        { "path": "/x", "title": "X", "parents": ["/", "/y"], "children": ["/y"] },
        { "path": "/y", "title": "Y", "parents": ["/x"], "children": ["/x"],
          "elements": [{ "id": "f", "kind": "file", "label": "y.tar" }] }
    ]))
}

/// A declares child B, but B does not declare A as its parent.
pub fn one_sided_site(allow_child_mismatch: bool) -> Value {
    site_with(json!([
        { "path": "/a", "title": "A", "children": ["/b"], "allow_child_mismatch": allow_child_mismatch },
        { "path": "/b", "title": "B" }
    ]))
}

/// A flat root with `count` children, all agreeing on their edges.
pub fn wide_site(count: usize) -> Value {
    let children: Vec<String> = (0..count).map(|i| format!("/p{i}")).collect();
    let mut pages = vec![json!({ "path": "/", "title": "Root", "children": children })];
    pages.extend((0..count).map(|i| {
        json!({
            "path": format!("/p{i}"),
            "title": format!("Page {i}"),
            "parents": ["/"],
            "elements": [{ "id": "e", "kind": if i % 7 == 0 { "file" } else { "heading" }, "label": "x" }]
        })
    }));
    site_with(Value::Array(pages))
}
