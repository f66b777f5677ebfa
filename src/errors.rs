//! Error types for comparisons.
//!
//! Extraction and encoding failures are fatal to a single comparison. Data
//! mismatches and pairing failures only ever skip one pair in a batch.

use thiserror::Error;

/// Errors that can occur while comparing two documents.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The text extraction collaborator could not produce text for a document.
    #[error("failed to extract text from {path}: {message}")]
    Extraction { path: String, message: String },

    /// The embedding encoder call failed or returned a malformed batch.
    #[error("embedding call failed: {message}")]
    Encoding { message: String },

    /// Ground truth and detected flags disagree on the paragraph count.
    #[error("paragraph count mismatch for {name}: expected {expected}, got {actual}")]
    DataMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// No renewal document or ground-truth file for a given name.
    #[error("cannot pair {name}: {message}")]
    Pairing { name: String, message: String },

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Threshold outside (0, 1].
    #[error("threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),
}

impl DiffError {
    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        DiffError::Encoding {
            message: message.into(),
        }
    }
}

/// Result type for comparison operations.
pub type DiffResult<T> = Result<T, DiffError>;
