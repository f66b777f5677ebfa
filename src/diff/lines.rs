//! Line-level diff between two paragraph texts.
//!
//! Lines are the paragraph's own line breaks; nothing is re-segmented.

/// Diff operation over line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOp {
    /// Lines at (left_idx, right_idx) are equal.
    Equal(usize, usize),
    /// Line at left_idx was removed.
    Delete(usize),
    /// Line at right_idx was added.
    Insert(usize),
}

impl LineOp {
    pub fn is_change(self) -> bool {
        !matches!(self, LineOp::Equal(..))
    }
}

/// Queryable line alignment between an expiring and a renewal paragraph.
#[derive(Debug, Clone)]
pub struct LineDiff<'a> {
    left: Vec<&'a str>,
    right: Vec<&'a str>,
    ops: Vec<LineOp>,
}

impl<'a> LineDiff<'a> {
    pub fn compute(left: &'a str, right: &'a str) -> Self {
        let left: Vec<&str> = left.lines().collect();
        let right: Vec<&str> = right.lines().collect();
        let ops = group_changes(lcs_diff(&left, &right));
        Self { left, right, ops }
    }

    pub fn left_lines(&self) -> &[&'a str] {
        &self.left
    }

    pub fn right_lines(&self) -> &[&'a str] {
        &self.right
    }

    pub fn ops(&self) -> &[LineOp] {
        &self.ops
    }

    /// Lines that exist only in the renewal paragraph.
    pub fn added(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.ops.iter().filter_map(move |op| match op {
            LineOp::Insert(j) => Some(self.right[*j]),
            _ => None,
        })
    }

    /// Lines that exist only in the expiring paragraph.
    pub fn removed(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.ops.iter().filter_map(move |op| match op {
            LineOp::Delete(i) => Some(self.left[*i]),
            _ => None,
        })
    }

    /// True when there is nothing to add or remove.
    pub fn is_empty(&self) -> bool {
        !self.ops.iter().any(|op| op.is_change())
    }
}

/// LCS table + backtrack. O(N*M) in the number of lines.
fn lcs_diff(left: &[&str], right: &[&str]) -> Vec<LineOp> {
    let n = left.len();
    let m = right.len();

    if n == 0 {
        return (0..m).map(LineOp::Insert).collect();
    }
    if m == 0 {
        return (0..n).map(LineOp::Delete).collect();
    }

    // dp[i][j] = length of LCS of left[0..i] and right[0..j]
    let mut dp = vec![vec![0usize; m + 1]; n + 1];
    for i in 1..=n {
        for j in 1..=m {
            dp[i][j] = if left[i - 1] == right[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && left[i - 1] == right[j - 1] {
            ops.push(LineOp::Equal(i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i][j - 1] >= dp[i - 1][j]) {
            ops.push(LineOp::Insert(j - 1));
            j -= 1;
        } else {
            ops.push(LineOp::Delete(i - 1));
            i -= 1;
        }
    }

    ops.reverse();
    ops
}

/// Within every run of changes, put deletions before insertions.
fn group_changes(ops: Vec<LineOp>) -> Vec<LineOp> {
    let mut grouped = Vec::with_capacity(ops.len());
    let mut deletes = Vec::new();
    let mut inserts = Vec::new();

    for op in ops {
        match op {
            LineOp::Delete(_) => deletes.push(op),
            LineOp::Insert(_) => inserts.push(op),
            LineOp::Equal(..) => {
                grouped.append(&mut deletes);
                grouped.append(&mut inserts);
                grouped.push(op);
            }
        }
    }
    grouped.append(&mut deletes);
    grouped.append(&mut inserts);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_paragraphs_have_no_changes() {
        let text = "Section 1\nLimit $1,000,000\nDeductible $5,000";
        let diff = LineDiff::compute(text, text);
        assert!(diff.is_empty());
        assert_eq!(diff.added().count(), 0);
        assert_eq!(diff.removed().count(), 0);
        assert_eq!(diff.ops().len(), 3);
    }

    #[test]
    fn modified_line_is_delete_then_insert() {
        let diff = LineDiff::compute("a\nb\nc", "a\nB\nc");
        assert_eq!(
            diff.ops(),
            &[
                LineOp::Equal(0, 0),
                LineOp::Delete(1),
                LineOp::Insert(1),
                LineOp::Equal(2, 2)
            ]
        );
        assert_eq!(diff.removed().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(diff.added().collect::<Vec<_>>(), vec!["B"]);
    }

    #[test]
    fn empty_sides() {
        let diff = LineDiff::compute("", "x\ny");
        assert_eq!(diff.ops(), &[LineOp::Insert(0), LineOp::Insert(1)]);
        let diff = LineDiff::compute("x", "");
        assert_eq!(diff.ops(), &[LineOp::Delete(0)]);
        assert!(LineDiff::compute("", "").is_empty());
    }

    #[test]
    fn change_runs_are_grouped() {
        let diff = LineDiff::compute("x\ny\nkeep", "p\nq\nkeep");
        assert_eq!(
            diff.ops(),
            &[
                LineOp::Delete(0),
                LineOp::Delete(1),
                LineOp::Insert(0),
                LineOp::Insert(1),
                LineOp::Equal(2, 2)
            ]
        );
    }
}
