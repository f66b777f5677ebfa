//! Report assembly.
//!
//! A [`Report`] is a pure function of the change records and the two
//! paragraph counts: identical inputs always render byte-identical output.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::classify::{ChangeRecord, ComparisonPolicy};
use crate::diff::{escape_html, DiffRenderer};
use crate::document::Document;

/// Title used when none is configured.
pub const DEFAULT_TITLE: &str = "Expiring vs. Renewal Policy Comparison Report";

const STYLESHEET: &str = "<style>
body { font-family: Calibri, sans-serif; }
table.diff { font-family: Courier, monospace; border: medium; }
table.diff td { white-space: pre; }
.diff_header { background-color: #e0e0e0; }
.diff_add { background-color: #aaffaa; }
.diff_chg { background-color: #ffff77; }
.diff_sub { background-color: #ffaaaa; }
</style>";

/// Ordered change records plus document-level counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub left_label: String,
    pub right_label: String,
    pub left_paragraphs: usize,
    pub right_paragraphs: usize,
    /// "exact" or "threshold"
    pub policy: String,
    /// One record per left paragraph, ordered by left index
    pub records: Vec<ChangeRecord>,
}

impl Report {
    /// Changed records in left-index order.
    pub fn changed(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(|r| r.status.is_changed())
    }

    pub fn has_changes(&self) -> bool {
        self.changed().next().is_some()
    }

    /// One flag per left paragraph, `true` = changed.
    pub fn change_flags(&self) -> Vec<bool> {
        self.records.iter().map(|r| r.status.is_changed()).collect()
    }

    fn block_title(record: &ChangeRecord) -> String {
        format!(
            "Paragraph {} - Possible Change (Similarity: {:.2})",
            record.left_index + 1,
            record.similarity
        )
    }

    fn count_line(&self, label: &str, count: usize) -> String {
        format!("Number of paragraphs in {} Policy: {}", label, count)
    }

    /// Self-contained HTML document with one diff table per change.
    pub fn to_html(&self) -> String {
        let mut parts = vec![
            format!(
                "<html><head><meta charset='UTF-8'><title>{}</title>",
                escape_html(&self.title)
            ),
            STYLESHEET.to_string(),
            "</head><body>".to_string(),
            format!("<h1>{}</h1>", escape_html(&self.title)),
            format!(
                "<p>{}</p>",
                escape_html(&self.count_line(&self.left_label, self.left_paragraphs))
            ),
            format!(
                "<p>{}</p>",
                escape_html(&self.count_line(&self.right_label, self.right_paragraphs))
            ),
        ];

        for record in self.changed() {
            let table = record.diff.as_ref().map_or("", |d| d.html.as_str());
            parts.push(format!(
                "<h3>{}</h3><div>{}</div><hr>",
                Self::block_title(record),
                table
            ));
        }

        parts.push("</body></html>".to_string());
        parts.join("\n")
    }

    /// Plain-text rendering with unified diffs.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{}", self.count_line(&self.left_label, self.left_paragraphs));
        let _ = writeln!(out, "{}", self.count_line(&self.right_label, self.right_paragraphs));

        for record in self.changed() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## {}", Self::block_title(record));
            if let Some(diff) = &record.diff {
                if !diff.unified.is_empty() {
                    let _ = writeln!(out, "{}", diff.unified);
                }
            }
        }
        out
    }

    /// Pretty JSON of the whole report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Attaches rendered diffs to changed records and wraps them in a [`Report`].
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    title: String,
    renderer: DiffRenderer,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DiffRenderer::default())
    }
}

impl ReportAssembler {
    pub fn new(title: impl Into<String>, renderer: DiffRenderer) -> Self {
        Self {
            title: title.into(),
            renderer,
        }
    }

    pub fn assemble(
        &self,
        left: &Document,
        right: &Document,
        mut records: Vec<ChangeRecord>,
        policy: ComparisonPolicy,
    ) -> Report {
        records.sort_by_key(|r| r.left_index);
        for record in records.iter_mut().filter(|r| r.status.is_changed()) {
            let left_text = left
                .paragraph(record.left_index)
                .map_or("", |p| p.text.as_str());
            let right_text = record
                .right_index
                .and_then(|j| right.paragraph(j))
                .map_or("", |p| p.text.as_str());
            record.diff = Some(self.renderer.render(left_text, right_text));
        }

        Report {
            title: self.title.clone(),
            left_label: left.label().to_string(),
            right_label: right.label().to_string(),
            left_paragraphs: left.len(),
            right_paragraphs: right.len(),
            policy: policy.name().to_string(),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ChangeStatus;
    use crate::document::{EXPIRING, RENEWAL};

    fn record(left_index: usize, right_index: usize, similarity: f64, changed: bool) -> ChangeRecord {
        ChangeRecord {
            left_index,
            right_index: Some(right_index),
            similarity,
            status: if changed {
                ChangeStatus::Changed
            } else {
                ChangeStatus::Unchanged
            },
            diff: None,
        }
    }

    fn sample_report() -> Report {
        let left = Document::from_paragraphs(EXPIRING, vec!["Limit $1,000", "Same"]);
        let right = Document::from_paragraphs(RENEWAL, vec!["Limit $2,000", "Same", "Extra"]);
        ReportAssembler::default().assemble(
            &left,
            &right,
            vec![record(1, 1, 1.0, false), record(0, 0, 0.876, true)],
            ComparisonPolicy::ExactText,
        )
    }

    #[test]
    fn records_are_sorted_and_only_changes_get_diffs() {
        let report = sample_report();
        assert_eq!(report.change_flags(), vec![true, false]);
        assert!(report.records[0].diff.is_some());
        assert!(report.records[1].diff.is_none());
        assert!(report.has_changes());
        assert_eq!((report.left_paragraphs, report.right_paragraphs), (2, 3));
    }

    #[test]
    fn html_contains_title_counts_and_blocks() {
        let html = sample_report().to_html();
        assert!(html.contains("<h1>Expiring vs. Renewal Policy Comparison Report</h1>"));
        assert!(html.contains("<p>Number of paragraphs in Expiring Policy: 2</p>"));
        assert!(html.contains("<p>Number of paragraphs in Renewal Policy: 3</p>"));
        assert!(html.contains("<h3>Paragraph 1 - Possible Change (Similarity: 0.88)</h3><div><table"));
        assert_eq!(html.matches("<h3>").count(), 1);
        assert!(html.ends_with("</body></html>"));
    }

    #[test]
    fn text_rendering() {
        insta::assert_snapshot!(sample_report().to_text(), @r###"
        Expiring vs. Renewal Policy Comparison Report
        Number of paragraphs in Expiring Policy: 2
        Number of paragraphs in Renewal Policy: 3

        ## Paragraph 1 - Possible Change (Similarity: 0.88)
        --- Expiring
        +++ Renewal
        @@ -1 +1 @@
        -Limit $1,000
        +Limit $2,000
        "###);
    }

    #[test]
    fn rendering_is_byte_identical_across_runs() {
        assert_eq!(sample_report().to_html(), sample_report().to_html());
        assert_eq!(sample_report().to_text(), sample_report().to_text());
        assert_eq!(
            sample_report().to_json().unwrap(),
            sample_report().to_json().unwrap()
        );
    }

    #[test]
    fn json_round_trips() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"policy\": \"exact\""));
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn no_changes_means_no_blocks() {
        let doc = Document::from_paragraphs(EXPIRING, vec!["Same"]);
        let report = ReportAssembler::default().assemble(
            &doc,
            &doc,
            vec![record(0, 0, 1.0, false)],
            ComparisonPolicy::ExactText,
        );
        assert!(!report.has_changes());
        assert!(!report.to_html().contains("<h3>"));
        assert_eq!(report.to_text().lines().count(), 3);
    }
}
