//! Value types shared by every folio crate: page references, capture levels,
//! cache keys and materialized pages.

pub mod ids;
pub mod level;
pub mod page;
pub mod page_ref;

pub use ids::{BookPath, DomainName, ElementId};
pub use level::{CaptureKey, CaptureLevel};
pub use page::{Element, NodeRef, Page, PageBuilder, ParentRef};
pub use page_ref::{BookRef, PageRef};
