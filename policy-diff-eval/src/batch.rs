//! Batch evaluation over a directory of annotated policy pairs.
//!
//! A pair that cannot be paired, extracted, encoded or length-matched is
//! skipped with a reason. Only the pairs that completed contribute to the
//! pooled labels.

use std::path::Path;

use policy_diff::{DiffConfig, DiffError, Encoder, Pipeline, PolicyKind};
use rayon::prelude::*;

use crate::errors::{EvalError, EvalResult};
use crate::extract::TextExtractor;
use crate::ground_truth::GroundTruth;
use crate::metrics::Metrics;
use crate::pairing::{pair_documents, DocumentPair, Pairing, SkippedPair};

/// Threshold policy at the default cutoff.
pub fn default_eval_config() -> DiffConfig {
    DiffConfig {
        policy: PolicyKind::Threshold,
        ..DiffConfig::default()
    }
}

/// Expected and detected flags for one evaluated pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairResult {
    pub name: String,
    pub expected: Vec<bool>,
    pub detected: Vec<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub evaluated: Vec<PairResult>,
    pub skipped: Vec<SkippedPair>,
}

impl BatchOutcome {
    /// Ground-truth labels of every evaluated pair, in pairing order.
    pub fn y_true(&self) -> Vec<bool> {
        self.evaluated
            .iter()
            .flat_map(|r| r.expected.iter().copied())
            .collect()
    }

    pub fn y_pred(&self) -> Vec<bool> {
        self.evaluated
            .iter()
            .flat_map(|r| r.detected.iter().copied())
            .collect()
    }

    pub fn metrics(&self) -> EvalResult<Metrics> {
        let y_true = self.y_true();
        if y_true.is_empty() {
            return Err(EvalError::NoData);
        }
        Ok(Metrics::compute(&y_true, &self.y_pred()))
    }
}

pub struct BatchRunner<X: TextExtractor> {
    config: DiffConfig,
    extractor: X,
    parallel: bool,
}

impl<X: TextExtractor> BatchRunner<X> {
    pub fn new(config: DiffConfig, extractor: X) -> Self {
        Self {
            config,
            extractor,
            parallel: false,
        }
    }

    /// Compare pairs on the rayon pool. Results keep pairing order.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run_dirs(
        &self,
        expiring_dir: &Path,
        renewal_dir: &Path,
        truth_dir: &Path,
        extension: &str,
    ) -> EvalResult<BatchOutcome> {
        let pairing = pair_documents(expiring_dir, renewal_dir, truth_dir, extension)?;
        self.run(pairing)
    }

    /// Evaluate already-paired documents.
    ///
    /// Configuration problems (bad threshold, unset API key variable) fail the
    /// whole batch before any pair is touched.
    pub fn run(&self, pairing: Pairing) -> EvalResult<BatchOutcome> {
        let encoder = self.config.build_encoder()?;
        self.config.classifier()?;

        let evaluate = |pair: &DocumentPair| self.evaluate_pair(&encoder, pair);
        let results: Vec<EvalResult<PairResult>> = if self.parallel {
            pairing.pairs.par_iter().map(evaluate).collect()
        } else {
            pairing.pairs.iter().map(evaluate).collect()
        };

        let mut outcome = BatchOutcome {
            evaluated: Vec::new(),
            skipped: pairing.skipped,
        };
        for (pair, result) in pairing.pairs.iter().zip(results) {
            match result {
                Ok(result) => outcome.evaluated.push(result),
                Err(error) => {
                    tracing::warn!(pair = %pair.name, %error, "skipping pair");
                    outcome.skipped.push(SkippedPair::new(pair.name.clone(), error));
                }
            }
        }

        tracing::info!(
            evaluated = outcome.evaluated.len(),
            skipped = outcome.skipped.len(),
            comparisons = outcome.y_true().len(),
            "batch finished"
        );
        Ok(outcome)
    }

    fn evaluate_pair<E: Encoder>(&self, encoder: E, pair: &DocumentPair) -> EvalResult<PairResult> {
        let truth = GroundTruth::load(&pair.ground_truth)?;
        let expiring = self.extractor.extract(&pair.expiring)?;
        let renewal = self.extractor.extract(&pair.renewal)?;

        let pipeline = Pipeline::from_config(encoder, &self.config)?;
        let detected = pipeline.detect_changes(&expiring, &renewal)?;

        if detected.len() != truth.paragraph_changes.len() {
            return Err(DiffError::DataMismatch {
                name: pair.name.clone(),
                expected: truth.paragraph_changes.len(),
                actual: detected.len(),
            }
            .into());
        }

        tracing::debug!(
            pair = %pair.name,
            paragraphs = detected.len(),
            changed = detected.iter().filter(|c| **c).count(),
            "evaluated pair"
        );
        Ok(PairResult {
            name: pair.name.clone(),
            expected: truth.paragraph_changes,
            detected,
        })
    }
}
