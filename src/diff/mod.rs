//! Human-readable diffs for changed paragraph pairs.
//!
//! Rendering is a pure function of the two paragraph texts. It never decides
//! whether a pair changed; that happened during classification.

mod html;
mod lines;
mod unified;

use serde::{Deserialize, Serialize};

use crate::document::{EXPIRING, RENEWAL};

pub use html::{escape_html, html_table};
pub use lines::{LineDiff, LineOp};
pub use unified::unified_diff;

/// Both renderings of one changed pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDiff {
    /// Unified line diff, empty when the texts are identical
    pub unified: String,
    /// Side-by-side HTML table
    pub html: String,
}

/// Renders unified and HTML diffs with fixed labels and layout settings.
#[derive(Debug, Clone)]
pub struct DiffRenderer {
    /// Context lines around each unified hunk (default 3)
    pub context_lines: usize,
    /// Display columns before HTML cells wrap, 0 = never (default 80)
    pub wrap_column: usize,
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self {
            context_lines: 3,
            wrap_column: 80,
        }
    }
}

impl DiffRenderer {
    pub fn render(&self, left: &str, right: &str) -> RenderedDiff {
        let diff = LineDiff::compute(left, right);
        RenderedDiff {
            unified: unified_diff(&diff, EXPIRING, RENEWAL, self.context_lines),
            html: html_table(&diff, EXPIRING, RENEWAL, self.wrap_column),
        }
    }
}
