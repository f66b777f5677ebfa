//! Paragraph segmentation on blank-line boundaries.

use once_cell::sync::Lazy;
use regex::Regex;

/// A line break, any whitespace (including further line breaks), a line break.
static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern is valid"));

/// Split raw document text into trimmed, non-empty paragraphs in source order.
///
/// Line breaks inside a paragraph are kept; paragraphs are never split into
/// sentences here.
pub fn segment(raw_text: &str) -> Vec<String> {
    BLANK_LINE
        .split(raw_text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}
