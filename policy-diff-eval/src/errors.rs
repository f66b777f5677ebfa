//! Error types for batch evaluation.

use policy_diff::DiffError;
use thiserror::Error;

/// Errors that can occur while evaluating a batch of policy pairs.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A directory or file could not be read.
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// A ground-truth file is not valid JSON of the expected shape.
    #[error("invalid ground truth in {path}: {message}")]
    GroundTruth { path: String, message: String },

    /// Every pair was skipped, so there is nothing to score.
    #[error("no data processed; check ground-truth files and detector output")]
    NoData,

    #[error(transparent)]
    Diff(#[from] DiffError),
}

/// Result type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;
