//! Side-by-side HTML diff table.
//!
//! Rows pair removed and added lines of the same change run as modified
//! lines (`diff_chg`, with the differing middle highlighted); the rest are
//! pure deletions (`diff_sub`) or additions (`diff_add`).

use std::fmt::Write;

use unicode_width::UnicodeWidthChar;

use super::lines::{LineDiff, LineOp};

const CLASS_ADD: &str = "diff_add";
const CLASS_SUB: &str = "diff_sub";
const CLASS_CHG: &str = "diff_chg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Equal(usize, usize),
    Changed(usize, usize),
    Removed(usize),
    Added(usize),
}

type Segment = (String, Option<&'static str>);

/// Render the full table. `wrap_column == 0` disables wrapping.
pub fn html_table(
    diff: &LineDiff<'_>,
    from_label: &str,
    to_label: &str,
    wrap_column: usize,
) -> String {
    let mut out = String::new();
    out.push_str("<table class=\"diff\">\n");
    let _ = writeln!(
        out,
        "<thead><tr><th colspan=\"2\" class=\"diff_header\">{}</th><th colspan=\"2\" class=\"diff_header\">{}</th></tr></thead>",
        escape_html(from_label),
        escape_html(to_label)
    );
    out.push_str("<tbody>\n");

    let left = diff.left_lines();
    let right = diff.right_lines();
    for row in build_rows(diff.ops()) {
        let (left_no, left_cell, right_no, right_cell) = match row {
            Row::Equal(i, j) => (
                Some(i),
                vec![(left[i].to_string(), None)],
                Some(j),
                vec![(right[j].to_string(), None)],
            ),
            Row::Changed(i, j) => {
                let (left_cell, right_cell) = highlight_change(left[i], right[j]);
                (Some(i), left_cell, Some(j), right_cell)
            }
            Row::Removed(i) => (
                Some(i),
                vec![(left[i].to_string(), Some(CLASS_SUB))],
                None,
                Vec::new(),
            ),
            Row::Added(j) => (
                None,
                Vec::new(),
                Some(j),
                vec![(right[j].to_string(), Some(CLASS_ADD))],
            ),
        };
        let _ = writeln!(
            out,
            "<tr>{}{}{}{}</tr>",
            line_number_cell(left_no),
            content_cell(&left_cell, wrap_column),
            line_number_cell(right_no),
            content_cell(&right_cell, wrap_column)
        );
    }

    out.push_str("</tbody>\n</table>");
    out
}

fn build_rows(ops: &[LineOp]) -> Vec<Row> {
    let mut rows = Vec::with_capacity(ops.len());
    let mut deletes = Vec::new();
    let mut inserts = Vec::new();

    for op in ops {
        match *op {
            LineOp::Delete(i) => deletes.push(i),
            LineOp::Insert(j) => inserts.push(j),
            LineOp::Equal(i, j) => {
                flush_run(&mut rows, &mut deletes, &mut inserts);
                rows.push(Row::Equal(i, j));
            }
        }
    }
    flush_run(&mut rows, &mut deletes, &mut inserts);
    rows
}

fn flush_run(rows: &mut Vec<Row>, deletes: &mut Vec<usize>, inserts: &mut Vec<usize>) {
    let paired = deletes.len().min(inserts.len());
    for k in 0..paired {
        rows.push(Row::Changed(deletes[k], inserts[k]));
    }
    rows.extend(deletes[paired..].iter().map(|&i| Row::Removed(i)));
    rows.extend(inserts[paired..].iter().map(|&j| Row::Added(j)));
    deletes.clear();
    inserts.clear();
}

/// Split both lines into common prefix, differing middle, common suffix.
fn highlight_change(left: &str, right: &str) -> (Vec<Segment>, Vec<Segment>) {
    let a: Vec<char> = left.chars().collect();
    let b: Vec<char> = right.chars().collect();

    let prefix = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    let max_suffix = a.len().min(b.len()) - prefix;
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();

    let pieces = |chars: &[char]| -> Vec<Segment> {
        let head: String = chars[..prefix].iter().collect();
        let middle: String = chars[prefix..chars.len() - suffix].iter().collect();
        let tail: String = chars[chars.len() - suffix..].iter().collect();
        vec![(head, None), (middle, Some(CLASS_CHG)), (tail, None)]
            .into_iter()
            .filter(|(text, _)| !text.is_empty())
            .collect()
    };

    (pieces(&a), pieces(&b))
}

/// Break segments into visual lines no wider than `width` display columns.
fn wrap_segments(segments: &[Segment], width: usize) -> Vec<Vec<Segment>> {
    if width == 0 {
        return vec![segments.to_vec()];
    }

    let mut lines: Vec<Vec<Segment>> = Vec::new();
    let mut line: Vec<Segment> = Vec::new();
    let mut used = 0usize;
    for (text, class) in segments {
        let mut current = String::new();
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used > 0 && used + w > width {
                if !current.is_empty() {
                    line.push((std::mem::take(&mut current), *class));
                }
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            current.push(c);
            used += w;
        }
        if !current.is_empty() {
            line.push((current, *class));
        }
    }
    lines.push(line);
    lines
}

fn content_cell(segments: &[Segment], wrap_column: usize) -> String {
    let visual: Vec<String> = wrap_segments(segments, wrap_column)
        .iter()
        .map(|line| {
            line.iter()
                .map(|(text, class)| match class {
                    Some(class) => format!("<span class=\"{}\">{}</span>", class, escape_html(text)),
                    None => escape_html(text),
                })
                .collect::<String>()
        })
        .collect();
    format!("<td nowrap=\"nowrap\">{}</td>", visual.join("<br>"))
}

fn line_number_cell(index: Option<usize>) -> String {
    match index {
        Some(i) => format!("<td class=\"diff_header\">{}</td>", i + 1),
        None => "<td class=\"diff_header\"></td>".to_string(),
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
