// src/error.rs
use folio_core::CaptureError;
use folio_executor::ExecutorError;
use thiserror::Error;

/// Errors surfaced by the folio integration layer.
#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Executor setup failed: {0}")]
    Executor(#[from] ExecutorError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid site definition: {0}")]
    Site(String),
}
