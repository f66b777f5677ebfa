//! Classic unified diff text.

use super::lines::{LineDiff, LineOp};

/// Render a unified diff with `context` lines around each change.
///
/// Returns an empty string when the two sides are identical.
pub fn unified_diff(
    diff: &LineDiff<'_>,
    from_label: &str,
    to_label: &str,
    context: usize,
) -> String {
    let ops = diff.ops();
    let hunks = hunk_ranges(ops, context);
    if hunks.is_empty() {
        return String::new();
    }

    // Line cursors before each op, plus the final position.
    let mut left_pos = Vec::with_capacity(ops.len() + 1);
    let mut right_pos = Vec::with_capacity(ops.len() + 1);
    let (mut i, mut j) = (0usize, 0usize);
    for op in ops {
        left_pos.push(i);
        right_pos.push(j);
        match op {
            LineOp::Equal(..) => {
                i += 1;
                j += 1;
            }
            LineOp::Delete(_) => i += 1,
            LineOp::Insert(_) => j += 1,
        }
    }
    left_pos.push(i);
    right_pos.push(j);

    let mut lines = vec![format!("--- {}", from_label), format!("+++ {}", to_label)];
    for (start, end) in hunks {
        lines.push(format!(
            "@@ -{} +{} @@",
            format_range(left_pos[start], left_pos[end]),
            format_range(right_pos[start], right_pos[end])
        ));

        for op in &ops[start..end] {
            lines.push(match *op {
                LineOp::Equal(i, _) => format!(" {}", diff.left_lines()[i]),
                LineOp::Delete(i) => format!("-{}", diff.left_lines()[i]),
                LineOp::Insert(j) => format!("+{}", diff.right_lines()[j]),
            });
        }
    }

    lines.join("\n")
}

/// Op index ranges `[start, end)` covering each change plus its context.
/// Changes separated by at most `2 * context` equal lines share a hunk.
fn hunk_ranges(ops: &[LineOp], context: usize) -> Vec<(usize, usize)> {
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for (pos, op) in ops.iter().enumerate() {
        if !op.is_change() {
            continue;
        }
        let start = pos.saturating_sub(context);
        let end = (pos + 1 + context).min(ops.len());
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => hunks.push((start, end)),
        }
    }
    hunks
}

/// `start,len` with 1-based start; a single line omits the length and an
/// empty range points at the line before.
fn format_range(start: usize, stop: usize) -> String {
    let length = stop - start;
    match length {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, length),
    }
}
