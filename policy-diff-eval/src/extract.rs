//! Document text extraction.
//!
//! OCR and PDF parsing happen outside this crate. The batch only needs
//! something that turns a path into raw text.

use std::path::Path;

use policy_diff::{DiffError, DiffResult};

pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> DiffResult<String>;
}

/// Reads pre-extracted UTF-8 text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> DiffResult<String> {
        std::fs::read_to_string(path).map_err(|e| DiffError::Extraction {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
