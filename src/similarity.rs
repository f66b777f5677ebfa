//! All-pairs cosine similarity and paragraph alignment.
//!
//! Rows of a [`SimilarityMatrix`] are left (expiring) paragraphs and columns
//! are right (renewal) paragraphs. An [`AlignmentStrategy`] turns the matrix
//! into exactly one [`AlignedPair`] per row.
//!
//! The default [`GreedyAlignment`] picks each row's best column on its own,
//! so two rows may land on the same column. [`OptimalAlignment`] enforces a
//! one-to-one assignment instead and can be swapped in without touching the
//! classifier or the renderers.

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};
use serde::{Deserialize, Serialize};

use crate::encoder::Embedding;
use crate::errors::{DiffError, DiffResult};

/// Cosine similarity in [-1, 1]; 0 when either vector has zero norm.
///
/// Both vectors must have the same dimension.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot_product = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // One square root of the product keeps sim(u, u) exactly 1.
    (dot_product / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0)
}

/// M×N matrix of cosine similarities.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: Vec<Vec<f64>>,
    columns: usize,
}

impl SimilarityMatrix {
    /// Compute every (left, right) similarity.
    pub fn compute(left: &[Embedding], right: &[Embedding]) -> Self {
        let values = left
            .iter()
            .map(|u| right.iter().map(|v| cosine_similarity(u, v)).collect())
            .collect();
        Self {
            values,
            columns: right.len(),
        }
    }

    /// Build from precomputed rows. Ragged rows are rejected.
    pub fn from_rows(values: Vec<Vec<f64>>) -> DiffResult<Self> {
        let columns = values.first().map_or(0, Vec::len);
        if let Some(row) = values.iter().position(|row| row.len() != columns) {
            return Err(DiffError::encoding(format!(
                "similarity row {} has {} columns, expected {}",
                row,
                values[row].len(),
                columns
            )));
        }
        Ok(Self { values, columns })
    }

    pub fn rows(&self) -> usize {
        self.values.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        self.values.get(row).map(Vec::as_slice)
    }

    /// Best column for a row, lowest index on ties. `None` with no columns
    /// or an out-of-range row.
    pub fn best_column(&self, row: usize) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (column, &score) in self.row(row)?.iter().enumerate() {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((column, score)),
            }
        }
        best
    }
}

/// Correspondence chosen for one left paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPair {
    pub left_index: usize,
    /// `None` only when the right document has no paragraphs
    pub right_index: Option<usize>,
    pub similarity: f64,
}

/// One entry per left paragraph, ordered by `left_index`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub pairs: Vec<AlignedPair>,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Right paragraphs chosen by more than one left paragraph.
    pub fn shared_targets(&self) -> Vec<usize> {
        let mut targets: Vec<usize> = self.pairs.iter().filter_map(|p| p.right_index).collect();
        targets.sort_unstable();
        let mut shared: Vec<usize> = targets
            .windows(2)
            .filter(|w| w[0] == w[1])
            .map(|w| w[0])
            .collect();
        shared.dedup();
        shared
    }
}

/// Turns a similarity matrix into one aligned pair per row.
pub trait AlignmentStrategy: Send + Sync {
    fn align(&self, matrix: &SimilarityMatrix) -> Alignment;

    fn name(&self) -> &'static str;
}

/// Per-row argmax. Several rows may select the same column.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAlignment;

impl AlignmentStrategy for GreedyAlignment {
    fn align(&self, matrix: &SimilarityMatrix) -> Alignment {
        let pairs = (0..matrix.rows())
            .map(|row| greedy_pair(matrix, row))
            .collect();
        Alignment { pairs }
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

fn greedy_pair(matrix: &SimilarityMatrix, row: usize) -> AlignedPair {
    match matrix.best_column(row) {
        Some((column, similarity)) => AlignedPair {
            left_index: row,
            right_index: Some(column),
            similarity,
        },
        None => AlignedPair {
            left_index: row,
            right_index: None,
            similarity: 0.0,
        },
    }
}

/// One-to-one maximum-total-similarity assignment (Kuhn-Munkres).
///
/// When the left side has more paragraphs than the right, the rows left
/// without a distinct column fall back to their greedy best match.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimalAlignment;

/// Similarities are scaled to integers for the assignment solver.
const WEIGHT_SCALE: f64 = 1_000_000.0;

impl AlignmentStrategy for OptimalAlignment {
    fn align(&self, matrix: &SimilarityMatrix) -> Alignment {
        let rows = matrix.rows();
        let columns = matrix.columns();
        if rows == 0 || columns == 0 {
            return GreedyAlignment.align(matrix);
        }

        let mut assigned: Vec<Option<usize>> = vec![None; rows];
        if rows <= columns {
            let weights = ScaledWeights::new(matrix, false);
            let (_, assignments) = kuhn_munkres(&weights);
            for (row, &column) in assignments.iter().enumerate() {
                assigned[row] = Some(column);
            }
        } else {
            let weights = ScaledWeights::new(matrix, true);
            let (_, assignments) = kuhn_munkres(&weights);
            for (column, &row) in assignments.iter().enumerate() {
                assigned[row] = Some(column);
            }
        }

        let pairs = assigned
            .into_iter()
            .enumerate()
            .map(|(row, column)| match column {
                Some(column) => AlignedPair {
                    left_index: row,
                    right_index: Some(column),
                    similarity: matrix.values[row][column],
                },
                None => greedy_pair(matrix, row),
            })
            .collect();
        Alignment { pairs }
    }

    fn name(&self) -> &'static str {
        "optimal"
    }
}

/// Wrapper for pathfinding's Weights trait, optionally transposed so the
/// solver always sees no more rows than columns.
struct ScaledWeights {
    data: Vec<Vec<i64>>,
}

impl ScaledWeights {
    fn new(matrix: &SimilarityMatrix, transpose: bool) -> Self {
        let scale = |v: f64| (v * WEIGHT_SCALE).round() as i64;
        let data = if transpose {
            (0..matrix.columns())
                .map(|c| (0..matrix.rows()).map(|r| scale(matrix.values[r][c])).collect())
                .collect()
        } else {
            matrix
                .values
                .iter()
                .map(|row| row.iter().map(|&v| scale(v)).collect())
                .collect()
        };
        Self { data }
    }
}

impl Weights<i64> for ScaledWeights {
    fn rows(&self) -> usize {
        self.data.len()
    }

    fn columns(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.data[row][col]
    }

    fn neg(&self) -> Self {
        let data = self
            .data
            .iter()
            .map(|row| row.iter().map(|&v| -v).collect())
            .collect();
        Self { data }
    }
}

/// Selectable alignment strategy, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentKind {
    #[default]
    Greedy,
    Optimal,
}

impl AlignmentKind {
    pub fn strategy(self) -> Box<dyn AlignmentStrategy> {
        match self {
            AlignmentKind::Greedy => Box::new(GreedyAlignment),
            AlignmentKind::Optimal => Box::new(OptimalAlignment),
        }
    }
}

impl std::str::FromStr for AlignmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" => Ok(AlignmentKind::Greedy),
            "optimal" => Ok(AlignmentKind::Optimal),
            other => Err(format!("unknown alignment strategy: {}", other)),
        }
    }
}

/// Builds the similarity matrix and applies an alignment strategy.
pub struct SimilarityMatcher {
    strategy: Box<dyn AlignmentStrategy>,
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityMatcher {
    /// Matcher using greedy per-row alignment.
    pub fn new() -> Self {
        Self::with_strategy(Box::new(GreedyAlignment))
    }

    pub fn with_strategy(strategy: Box<dyn AlignmentStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn align(
        &self,
        left: &[Embedding],
        right: &[Embedding],
    ) -> (SimilarityMatrix, Alignment) {
        let matrix = SimilarityMatrix::compute(left, right);
        let alignment = self.strategy.align(&matrix);
        tracing::debug!(
            rows = matrix.rows(),
            columns = matrix.columns(),
            strategy = self.strategy.name(),
            shared_targets = alignment.shared_targets().len(),
            "aligned paragraphs"
        );
        (matrix, alignment)
    }
}
