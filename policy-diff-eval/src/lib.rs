//! Batch evaluation for policy-diff.
//!
//! Pairs expiring and renewal policy documents by insured name, runs the
//! comparison on each pair and scores the detected paragraph changes against
//! hand-annotated ground truth.
//!
//! ## Modules
//!
//! - [`pairing`] - Filename date stripping and document pairing
//! - [`ground_truth`] - `paragraph_changes` annotation files
//! - [`extract`] - Text extraction seam
//! - [`batch`] - Runs the comparison over every pair
//! - [`metrics`] - Accuracy, precision, recall, F1 and confusion matrix
//! - [`errors`] - Error types for evaluation

pub mod batch;
pub mod errors;
pub mod extract;
pub mod ground_truth;
pub mod metrics;
pub mod pairing;

pub use batch::{default_eval_config, BatchOutcome, BatchRunner, PairResult};
pub use errors::{EvalError, EvalResult};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use ground_truth::GroundTruth;
pub use metrics::{ConfusionMatrix, LabelReport, Metrics};
pub use pairing::{pair_documents, strip_date_from_filename, DocumentPair, Pairing, SkippedPair};

#[cfg(test)]
mod tests;
