// src/error.rs
//! Defines the error types for capture operations.

use folio_traits::ExecutorError;
use folio_types::PageRef;
use thiserror::Error;

/// Errors raised by a page producer.
#[derive(Error, Debug)]
pub enum ProducerError {
    /// The producer itself failed to generate the page.
    #[error("{0}")]
    Failed(String),

    /// A nested capture requested by the producer failed. The nested error is
    /// propagated to the caller of the outer capture unchanged.
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl ProducerError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProducerError::Failed(message.into())
    }
}

/// The main error enum for capture operations.
///
/// None of these are retried by the engine: producer mismatches and edge
/// inconsistencies are authoring defects, and coordinator misuse is a
/// programming error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("No page captured, page={page_ref}")]
    NoPageCaptured { page_ref: PageRef },

    #[error("Captured page has unexpected page reference. Expected {expected} but got {actual}")]
    ProducerMismatch { expected: PageRef, actual: PageRef },

    #[error("The parent page does not have this as a child. this={page}, parent={parent}")]
    ParentMismatch { page: PageRef, parent: PageRef },

    #[error("The child page does not have this as a parent. this={page}, child={child}")]
    ChildMismatch { page: PageRef, child: PageRef },

    #[error("Failed to produce page {page_ref}: {message}")]
    Producer { page_ref: PageRef, message: String },

    #[error("Concurrency has not been observed for this request")]
    CoordinatorInactive,

    #[error("Request attribute '{key}' holds a value of a different type")]
    AttributeType { key: String },

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl CaptureError {
    /// The producer returned nothing, or a page with the wrong identity.
    pub fn is_producer_mismatch(&self) -> bool {
        matches!(
            self,
            CaptureError::NoPageCaptured { .. } | CaptureError::ProducerMismatch { .. }
        )
    }

    /// A declared parent/child edge was not asserted by the other endpoint.
    pub fn is_edge_inconsistency(&self) -> bool {
        matches!(
            self,
            CaptureError::ParentMismatch { .. } | CaptureError::ChildMismatch { .. }
        )
    }
}
