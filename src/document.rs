//! Segmented documents.
//!
//! A [`Document`] is built once from raw text (or an already segmented list)
//! and never mutated afterwards. Paragraph indices are positions in the
//! document and are what every downstream report refers to.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;
use crate::segment::segment;

/// Label used for the older of the two documents.
pub const EXPIRING: &str = "Expiring";
/// Label used for the newer of the two documents.
pub const RENEWAL: &str = "Renewal";

/// One paragraph of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Position in the owning document (0-based)
    pub index: usize,
    /// Trimmed paragraph text with internal line breaks preserved
    pub text: String,
    /// `text` with dates removed
    pub normalized_text: String,
}

impl Paragraph {
    fn new(index: usize, text: String) -> Self {
        let normalized_text = normalize(&text);
        Self {
            index,
            text,
            normalized_text,
        }
    }
}

/// An ordered sequence of paragraphs plus an identifying label.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    label: String,
    paragraphs: Vec<Paragraph>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("label", &self.label)
            .field("paragraph_count", &self.paragraphs.len())
            .finish()
    }
}

impl Document {
    /// Segment raw text as-is.
    pub fn from_text(label: impl Into<String>, raw_text: &str) -> Self {
        Self::from_paragraphs(label, segment(raw_text))
    }

    /// Remove dates from the whole text first, then segment.
    ///
    /// A paragraph that consisted only of a date disappears entirely, so the
    /// paragraph count can be lower than with [`Document::from_text`].
    pub fn from_normalized_text(label: impl Into<String>, raw_text: &str) -> Self {
        Self::from_paragraphs(label, segment(&normalize(raw_text)))
    }

    /// Wrap paragraphs that were segmented elsewhere.
    ///
    /// Texts are trimmed and empty entries are dropped, matching what the
    /// segmenter would have produced.
    pub fn from_paragraphs<I, S>(label: impl Into<String>, paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paragraphs = paragraphs
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(index, text)| Paragraph::new(index, text))
            .collect();
        Self {
            label: label.into(),
            paragraphs,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Paragraph texts in order, as handed to the encoder.
    pub fn texts(&self) -> Vec<&str> {
        self.paragraphs.iter().map(|p| p.text.as_str()).collect()
    }
}
