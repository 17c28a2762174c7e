use folio::traversal::child_nodes;
use folio::{
    BookRef, CaptureContext, CaptureLevel, Capturer, FilteredTree, FolioError, InMemorySite, KindFilter, NodeRef,
    PageRef, find_matches, pages, prune, verify,
};
use folio::EngineBuilder;
use std::env;
use std::sync::Arc;

fn print_tree(tree: &FilteredTree, depth: usize) {
    println!("{:indent$}- {} ({})", "", tree.label, tree.node, indent = depth * 2);
    for child in &tree.children {
        print_tree(child, depth + 1);
    }
}

fn show(capturer: &dyn Capturer, page_ref: &PageRef, kind: Option<&str>) -> Result<(), FolioError> {
    let mut ctx = CaptureContext::new();
    let page = capturer.capture(&mut ctx, page_ref, CaptureLevel::Body)?;
    verify::full_verify(capturer, &ctx, &page)?;

    println!("{}", page);
    if let Some(body) = &page.body {
        println!("\n{}\n", body);
    }
    let root = NodeRef::Page(page_ref.clone());
    for child in child_nodes(capturer, &mut ctx, &root, false)? {
        let child_page = capturer.capture(&mut ctx, child.page_ref(), CaptureLevel::Page)?;
        println!("  > {} [{}]", pages::short_title(Some(page_ref), &child_page), child);
    }

    if let Some(kind) = kind {
        let filter = KindFilter::new(kind);
        let matches = find_matches(capturer, &mut ctx, &filter, &root, true)?;
        match prune(capturer, &mut ctx, &matches, &root, true)? {
            Some(tree) => {
                println!("\nPages leading to '{}' elements:", kind);
                print_tree(&tree, 0);
            }
            None => println!("\nNo '{}' elements below this page.", kind),
        }
    }
    Ok(())
}

/// A small CLI that captures one page of a JSON-described site.
fn main() -> Result<(), FolioError> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 || args.len() > 5 {
        eprintln!("Captures a page from a JSON site definition and verifies its edges.");
        eprintln!();
        eprintln!(
            "Usage: {} <path/to/site.json> <domain:/book> <page path> [element kind]",
            args[0]
        );
        std::process::exit(1);
    }

    let (domain, book_path) = args[2]
        .split_once(':')
        .ok_or_else(|| FolioError::Config(format!("Book must be given as domain:/path, got '{}'", args[2])))?;
    let page_ref = PageRef::new(BookRef::new(domain, book_path), &args[3]);

    let site = Arc::new(InMemorySite::from_file(&args[1])?);
    let engine = EngineBuilder::new().with_site(site).build()?;
    engine.run_request(|capturer| show(capturer, &page_ref, args.get(4).map(String::as_str)))
}
