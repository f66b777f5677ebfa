//! Paragraph-level classification metrics.
//!
//! "Changed" is the positive class. Any ratio with a zero denominator is
//! reported as 0.0.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Counts of truth/prediction combinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Pairs `y_true[i]` with `y_pred[i]`; a longer slice's tail is ignored.
    pub fn from_labels(y_true: &[bool], y_pred: &[bool]) -> Self {
        let mut matrix = Self::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth, pred) {
                (false, false) => matrix.true_negatives += 1,
                (false, true) => matrix.false_positives += 1,
                (true, false) => matrix.false_negatives += 1,
                (true, true) => matrix.true_positives += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelReport {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl LabelReport {
    fn new(label: &str, tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        Self {
            label: label.to_string(),
            precision,
            recall,
            f1: f1(precision, recall),
            support: tp + fn_,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub comparisons: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
    /// "Unchanged" then "Changed"
    pub labels: Vec<LabelReport>,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl Metrics {
    pub fn compute(y_true: &[bool], y_pred: &[bool]) -> Self {
        let confusion = ConfusionMatrix::from_labels(y_true, y_pred);
        let ConfusionMatrix {
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
            true_positives: tp,
        } = confusion;

        let changed = LabelReport::new("Changed", tp, fp, fn_);
        let unchanged = LabelReport::new("Unchanged", tn, fn_, fp);

        Self {
            comparisons: confusion.total(),
            accuracy: ratio(tp + tn, confusion.total()),
            precision: changed.precision,
            recall: changed.recall,
            f1: changed.f1,
            confusion,
            labels: vec![unchanged, changed],
        }
    }

    /// Plain-text summary, classification report and confusion matrix.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Paragraph-level Evaluation ({} comparisons):",
            self.comparisons
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Accuracy:  {:.4}", self.accuracy);
        let _ = writeln!(out, "Precision: {:.4}", self.precision);
        let _ = writeln!(out, "Recall:    {:.4}", self.recall);
        let _ = writeln!(out, "F1 Score:  {:.4}", self.f1);
        let _ = writeln!(out);
        let _ = writeln!(out, "Detailed Classification Report:");
        let _ = writeln!(
            out,
            "{:>12}{:>11}{:>10}{:>10}{:>10}",
            "", "precision", "recall", "f1-score", "support"
        );
        for label in &self.labels {
            let _ = writeln!(
                out,
                "{:>12}{:>11.2}{:>10.2}{:>10.2}{:>10}",
                label.label, label.precision, label.recall, label.f1, label.support
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Confusion Matrix (rows = truth, columns = prediction):");
        let _ = writeln!(out, "{:>12}{:>11}{:>10}", "", "Unchanged", "Changed");
        let c = &self.confusion;
        let _ = writeln!(
            out,
            "{:>12}{:>11}{:>10}",
            "Unchanged", c.true_negatives, c.false_positives
        );
        let _ = writeln!(
            out,
            "{:>12}{:>11}{:>10}",
            "Changed", c.false_negatives, c.true_positives
        );
        out
    }
}
