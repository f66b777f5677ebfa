//! Paragraph-level change detection between an expiring insurance policy and
//! its renewal.
//!
//! The comparison runs in stages:
//!
//! - [`normalize()`] - Strips calendar dates so routine date drift is ignored
//! - [`segment()`] - Splits raw text on blank lines into [`Paragraph`]s
//! - [`Encoder`] - Maps paragraph texts to embeddings ([`HashingEncoder`], [`HttpEncoder`])
//! - [`SimilarityMatcher`] - Builds the cosine matrix and aligns paragraphs
//! - [`ChangeClassifier`] - Marks each aligned pair changed or unchanged
//! - [`DiffRenderer`] - Unified and side-by-side HTML diffs for changed pairs
//! - [`ReportAssembler`] - Collects everything into a [`Report`]
//!
//! [`Pipeline`] wires the stages together.
//!
//! ## Example
//!
//! ```ignore
//! use policy_diff::{HashingEncoder, Pipeline};
//!
//! let report = Pipeline::new(HashingEncoder::default())
//!     .compare_texts("Limit $1,000\n\nSame", "Limit $2,000\n\nSame")?;
//! assert_eq!(report.change_flags(), vec![true, false]);
//! ```

mod classify;
mod config;
mod diff;
mod document;
mod encoder;
mod errors;
mod normalize;
mod pipeline;
mod report;
mod segment;
mod similarity;

pub use classify::{ChangeClassifier, ChangeRecord, ChangeStatus, ComparisonPolicy, DEFAULT_THRESHOLD};
pub use config::{DiffConfig, EncoderConfig, PolicyKind, ReportConfig};
pub use diff::{escape_html, html_table, unified_diff, DiffRenderer, LineDiff, LineOp, RenderedDiff};
pub use document::{Document, Paragraph, EXPIRING, RENEWAL};
pub use encoder::{Embedding, Encoder, HashingEncoder, HttpEncoder};
pub use errors::{DiffError, DiffResult};
pub use normalize::normalize;
pub use pipeline::Pipeline;
pub use report::{Report, ReportAssembler, DEFAULT_TITLE};
pub use segment::segment;
pub use similarity::{
    cosine_similarity, AlignedPair, Alignment, AlignmentKind, AlignmentStrategy, GreedyAlignment,
    OptimalAlignment, SimilarityMatcher, SimilarityMatrix,
};

#[cfg(test)]
mod tests {
    mod pipeline;
}
