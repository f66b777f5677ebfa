//! Per-pair change classification.
//!
//! Both comparison policies consume the same [`Alignment`]; they differ only
//! in the decision applied to each pair.

use serde::{Deserialize, Serialize};

use crate::diff::RenderedDiff;
use crate::document::{Document, Paragraph};
use crate::errors::{DiffError, DiffResult};
use crate::similarity::Alignment;

/// Threshold used when none is configured.
pub const DEFAULT_THRESHOLD: f64 = 0.95;

/// How an aligned pair is judged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ComparisonPolicy {
    /// Changed iff the paragraph texts differ byte for byte.
    #[default]
    ExactText,
    /// Changed iff similarity is strictly below the threshold. Documents are
    /// date-normalized before segmentation under this policy.
    Threshold { threshold: f64 },
}

impl ComparisonPolicy {
    /// Threshold policy with a validated cutoff in (0, 1].
    pub fn threshold(threshold: f64) -> DiffResult<Self> {
        if threshold.is_nan() || threshold <= 0.0 || threshold > 1.0 {
            return Err(DiffError::InvalidThreshold(threshold));
        }
        Ok(ComparisonPolicy::Threshold { threshold })
    }

    /// Whether documents should be date-normalized before segmentation.
    pub fn normalizes_input(&self) -> bool {
        matches!(self, ComparisonPolicy::Threshold { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComparisonPolicy::ExactText => "exact",
            ComparisonPolicy::Threshold { .. } => "threshold",
        }
    }
}

/// Outcome for one aligned pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    Unchanged,
    Changed,
}

impl ChangeStatus {
    pub fn is_changed(self) -> bool {
        self == ChangeStatus::Changed
    }
}

/// Classification of one left paragraph against its aligned right paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub left_index: usize,
    /// `None` when the right document is empty
    pub right_index: Option<usize>,
    pub similarity: f64,
    pub status: ChangeStatus,
    /// Rendered only for changed pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<RenderedDiff>,
}

/// Applies a [`ComparisonPolicy`] to every pair of an alignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeClassifier {
    policy: ComparisonPolicy,
}

impl ChangeClassifier {
    pub fn new(policy: ComparisonPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ComparisonPolicy {
        self.policy
    }

    /// Decide a single pair. A missing right paragraph is always a change.
    pub fn classify(
        &self,
        left: &Paragraph,
        right: Option<&Paragraph>,
        similarity: f64,
    ) -> ChangeStatus {
        let right = match right {
            Some(right) => right,
            None => return ChangeStatus::Changed,
        };
        let changed = match self.policy {
            ComparisonPolicy::ExactText => left.text != right.text,
            ComparisonPolicy::Threshold { threshold } => similarity < threshold,
        };
        if changed {
            ChangeStatus::Changed
        } else {
            ChangeStatus::Unchanged
        }
    }

    /// One record per alignment entry, ordered by left index. Diffs are not
    /// rendered here.
    pub fn classify_alignment(
        &self,
        left: &Document,
        right: &Document,
        alignment: &Alignment,
    ) -> Vec<ChangeRecord> {
        let mut records: Vec<ChangeRecord> = alignment
            .pairs
            .iter()
            .filter_map(|pair| {
                let left_paragraph = left.paragraph(pair.left_index)?;
                let right_paragraph = pair.right_index.and_then(|j| right.paragraph(j));
                Some(ChangeRecord {
                    left_index: pair.left_index,
                    right_index: pair.right_index,
                    similarity: pair.similarity,
                    status: self.classify(left_paragraph, right_paragraph, pair.similarity),
                    diff: None,
                })
            })
            .collect();
        records.sort_by_key(|r| r.left_index);
        records
    }
}
