//! End-to-end comparison of an expiring and a renewal document.
//!
//! Stages run in a fixed order: segmentation (with date normalization under
//! the threshold policy), one batched encoder call per document, alignment,
//! classification and report assembly. Any stage failure aborts the whole
//! comparison; no partial report is produced.

use crate::classify::{ChangeClassifier, ComparisonPolicy};
use crate::config::DiffConfig;
use crate::document::{Document, EXPIRING, RENEWAL};
use crate::encoder::{encode_checked, Encoder};
use crate::errors::{DiffError, DiffResult};
use crate::normalize::normalize;
use crate::report::{Report, ReportAssembler};
use crate::similarity::SimilarityMatcher;

/// A configured comparison over some [`Encoder`].
pub struct Pipeline<E: Encoder> {
    encoder: E,
    matcher: SimilarityMatcher,
    classifier: ChangeClassifier,
    assembler: ReportAssembler,
}

impl<E: Encoder> Pipeline<E> {
    /// Exact-text policy, greedy alignment and default report layout.
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            matcher: SimilarityMatcher::new(),
            classifier: ChangeClassifier::default(),
            assembler: ReportAssembler::default(),
        }
    }

    pub fn from_config(encoder: E, config: &DiffConfig) -> DiffResult<Self> {
        Ok(Self {
            encoder,
            matcher: config.matcher(),
            classifier: config.classifier()?,
            assembler: config.assembler(),
        })
    }

    pub fn with_policy(mut self, policy: ComparisonPolicy) -> Self {
        self.classifier = ChangeClassifier::new(policy);
        self
    }

    pub fn with_matcher(mut self, matcher: SimilarityMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_assembler(mut self, assembler: ReportAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn policy(&self) -> ComparisonPolicy {
        self.classifier.policy()
    }

    /// Segment both raw texts and compare them.
    pub fn compare_texts(&self, expiring: &str, renewal: &str) -> DiffResult<Report> {
        let (left, right) = if self.policy().normalizes_input() {
            (
                Document::from_normalized_text(EXPIRING, expiring),
                Document::from_normalized_text(RENEWAL, renewal),
            )
        } else {
            (
                Document::from_text(EXPIRING, expiring),
                Document::from_text(RENEWAL, renewal),
            )
        };
        self.compare_documents(&left, &right)
    }

    /// Compare paragraphs that were segmented elsewhere.
    pub fn compare_paragraphs<S: AsRef<str>>(
        &self,
        expiring: &[S],
        renewal: &[S],
    ) -> DiffResult<Report> {
        let build = |label: &str, paragraphs: &[S]| {
            if self.policy().normalizes_input() {
                Document::from_paragraphs(label, paragraphs.iter().map(|p| normalize(p.as_ref())))
            } else {
                Document::from_paragraphs(label, paragraphs.iter().map(|p| p.as_ref().to_string()))
            }
        };
        self.compare_documents(&build(EXPIRING, expiring), &build(RENEWAL, renewal))
    }

    pub fn compare_documents(&self, left: &Document, right: &Document) -> DiffResult<Report> {
        let left_vectors = encode_checked(&self.encoder, &left.texts())?;
        let right_vectors = encode_checked(&self.encoder, &right.texts())?;

        if let (Some(l), Some(r)) = (left_vectors.first(), right_vectors.first()) {
            if l.len() != r.len() {
                return Err(DiffError::encoding(format!(
                    "expiring vectors have {} dimensions, renewal vectors have {}",
                    l.len(),
                    r.len()
                )));
            }
        }

        let (_, alignment) = self.matcher.align(&left_vectors, &right_vectors);
        let records = self.classifier.classify_alignment(left, right, &alignment);
        let report = self
            .assembler
            .assemble(left, right, records, self.classifier.policy());

        tracing::debug!(
            expiring = left.len(),
            renewal = right.len(),
            policy = report.policy.as_str(),
            changed = report.changed().count(),
            "compared documents"
        );
        Ok(report)
    }

    /// Per-paragraph change flags for the expiring document.
    pub fn detect_changes(&self, expiring: &str, renewal: &str) -> DiffResult<Vec<bool>> {
        Ok(self.compare_texts(expiring, renewal)?.change_flags())
    }
}
