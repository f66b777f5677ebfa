use crate::{default_eval_config, BatchRunner, EvalError, PlainTextExtractor};
use policy_diff::{DiffConfig, PolicyKind};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Corpus {
    _root: TempDir,
    expiring: PathBuf,
    renewal: PathBuf,
    truth: PathBuf,
}

impl Corpus {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let expiring = root.path().join("EXPIRING");
        let renewal = root.path().join("RENEWAL");
        let truth = root.path().join("ANNOTATIONS");
        for dir in [&expiring, &renewal, &truth] {
            fs::create_dir(dir).unwrap();
        }
        Self {
            _root: root,
            expiring,
            renewal,
            truth,
        }
    }

    fn add(&self, name: &str, expiring: &str, renewal: &str, truth: Option<&str>) {
        fs::write(self.expiring.join(format!("{} @ 04-01-2024.txt", name)), expiring).unwrap();
        fs::write(self.renewal.join(format!("{} @ 04-01-2025.txt", name)), renewal).unwrap();
        if let Some(truth) = truth {
            fs::write(self.truth.join(format!("{}.json", name)), truth).unwrap();
        }
    }

    fn run(&self, runner: &BatchRunner<PlainTextExtractor>) -> crate::EvalResult<crate::BatchOutcome> {
        runner.run_dirs(&self.expiring, &self.renewal, &self.truth, "txt")
    }
}

const EXPIRING: &str = "A widget costs $5 each and every loss\n\nStandard clause text unchanged";
const RENEWAL: &str = "A widget costs $6 each and every loss\n\nStandard clause text unchanged";

fn runner() -> BatchRunner<PlainTextExtractor> {
    BatchRunner::new(default_eval_config(), PlainTextExtractor)
}

#[test]
fn perfect_pair_scores_one() {
    let corpus = Corpus::new();
    corpus.add("ABC COMPANY", EXPIRING, RENEWAL, Some(r#"{"paragraph_changes": [true, false]}"#));

    let outcome = corpus.run(&runner()).unwrap();
    assert_eq!(outcome.evaluated.len(), 1);
    assert_eq!(outcome.evaluated[0].name, "ABC COMPANY");
    assert_eq!(outcome.y_pred(), vec![true, false]);

    let metrics = outcome.metrics().unwrap();
    assert_eq!(metrics.accuracy, 1.0);
    assert_eq!(metrics.precision, 1.0);
    assert_eq!(metrics.recall, 1.0);
}

#[test]
fn length_mismatch_skips_only_that_pair() {
    let corpus = Corpus::new();
    corpus.add("ABC COMPANY", EXPIRING, RENEWAL, Some(r#"{"paragraph_changes": [true, false]}"#));
    corpus.add(
        "XYZ LLC",
        EXPIRING,
        RENEWAL,
        Some(r#"{"paragraph_changes": [true, false, false]}"#),
    );

    let outcome = corpus.run(&runner()).unwrap();
    assert_eq!(outcome.evaluated.len(), 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].name, "XYZ LLC");
    assert!(outcome.skipped[0].reason.contains("expected 3, got 2"));
    assert_eq!(outcome.metrics().unwrap().comparisons, 2);
}

#[test]
fn missing_annotation_and_bad_text_are_skipped() {
    let corpus = Corpus::new();
    corpus.add("ABC COMPANY", EXPIRING, RENEWAL, Some(r#"{"paragraph_changes": [true, false]}"#));
    corpus.add("NO TRUTH CO", EXPIRING, RENEWAL, None);
    corpus.add("BINARY INC", "x", "y", Some(r#"{"paragraph_changes": [false]}"#));
    fs::write(
        corpus.expiring.join("BINARY INC @ 04-01-2024.txt"),
        [0xff, 0xfe, 0xfd],
    )
    .unwrap();

    let outcome = corpus.run(&runner()).unwrap();
    let mut skipped: Vec<_> = outcome.skipped.iter().map(|s| s.name.as_str()).collect();
    skipped.sort();
    assert_eq!(skipped, vec!["BINARY INC", "NO TRUTH CO"]);
    assert!(outcome
        .skipped
        .iter()
        .any(|s| s.reason.contains("failed to extract text")));
    assert_eq!(outcome.y_true(), vec![true, false]);
}

#[test]
fn parallel_run_matches_sequential() {
    let corpus = Corpus::new();
    for name in ["A CORP", "B CORP", "C CORP", "D CORP"] {
        corpus.add(name, EXPIRING, RENEWAL, Some(r#"{"paragraph_changes": [true, true]}"#));
    }

    let sequential = corpus.run(&runner()).unwrap();
    let parallel = corpus.run(&runner().with_parallel(true)).unwrap();
    assert_eq!(sequential.evaluated, parallel.evaluated);
    assert_eq!(parallel.evaluated[0].name, "A CORP");
    assert_eq!(parallel.metrics().unwrap().recall, 0.5);
}

#[test]
fn exact_policy_from_config() {
    let corpus = Corpus::new();
    corpus.add(
        "DATED CO",
        "Effective January 1, 2024\n\nLimit $1,000",
        "Effective January 1, 2025\n\nLimit $1,000",
        Some(r#"{"paragraph_changes": [false, false]}"#),
    );

    let threshold = corpus.run(&runner()).unwrap();
    assert_eq!(threshold.y_pred(), vec![false, false]);

    let exact = BatchRunner::new(
        DiffConfig {
            policy: PolicyKind::Exact,
            ..DiffConfig::default()
        },
        PlainTextExtractor,
    );
    assert_eq!(corpus.run(&exact).unwrap().y_pred(), vec![true, false]);
}

#[test]
fn nothing_processed_is_no_data() {
    let corpus = Corpus::new();
    corpus.add("NO TRUTH CO", EXPIRING, RENEWAL, None);
    let outcome = corpus.run(&runner()).unwrap();
    assert!(matches!(outcome.metrics(), Err(EvalError::NoData)));
}

#[test]
fn invalid_threshold_fails_the_batch() {
    let corpus = Corpus::new();
    let config = DiffConfig {
        threshold: 0.0,
        ..default_eval_config()
    };
    let err = corpus
        .run(&BatchRunner::new(config, PlainTextExtractor))
        .unwrap_err();
    assert!(matches!(err, EvalError::Diff(_)));
}
