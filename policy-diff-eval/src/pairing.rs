//! Matching expiring documents to their renewals and annotations.
//!
//! Documents are named `<insured> @ <date>.<ext>`. The date differs between
//! the expiring and renewal copies, so pairing goes by the stripped name.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use policy_diff::DiffError;
use regex::Regex;

use crate::errors::{EvalError, EvalResult};

static DATE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*@\s*\d{1,2}[-/]\d{1,2}[-/]\d{2,4}").expect("filename date pattern is valid")
});

/// `"ABC COMPANY @ 04-01-2024.pdf"` → `"ABC COMPANY"`.
pub fn strip_date_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    DATE_SUFFIX.replace_all(&stem, "").trim().to_string()
}

/// One expiring/renewal pair with its annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    pub name: String,
    pub expiring: PathBuf,
    pub renewal: PathBuf,
    pub ground_truth: PathBuf,
}

/// A pair left out of the batch and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPair {
    pub name: String,
    pub reason: String,
}

impl SkippedPair {
    pub fn new(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            name: name.into(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    pub pairs: Vec<DocumentPair>,
    pub skipped: Vec<SkippedPair>,
}

/// Pair every expiring document with a renewal and a `<name>.json` annotation.
///
/// Both directories are scanned in file-name order, and the first renewal
/// whose stripped name matches wins.
pub fn pair_documents(
    expiring_dir: &Path,
    renewal_dir: &Path,
    truth_dir: &Path,
    extension: &str,
) -> EvalResult<Pairing> {
    let expiring_files = list_files(expiring_dir, extension)?;
    let renewal_files: Vec<(String, PathBuf)> = list_files(renewal_dir, extension)?
        .into_iter()
        .map(|path| (stripped_name(&path), path))
        .collect();

    let mut pairing = Pairing::default();
    for expiring in expiring_files {
        let name = stripped_name(&expiring);
        let renewal = renewal_files
            .iter()
            .find(|(renewal_name, _)| *renewal_name == name)
            .map(|(_, path)| path.clone());
        let ground_truth = truth_dir.join(format!("{}.json", name));

        let renewal = match renewal {
            Some(renewal) if ground_truth.is_file() => renewal,
            renewal => {
                let message = if renewal.is_none() {
                    "no matching renewal document"
                } else {
                    "no ground-truth annotation"
                };
                let error = DiffError::Pairing {
                    name: name.clone(),
                    message: message.to_string(),
                };
                tracing::warn!(%error, "skipping pair");
                pairing.skipped.push(SkippedPair::new(name, error));
                continue;
            }
        };

        pairing.pairs.push(DocumentPair {
            name,
            expiring,
            renewal,
            ground_truth,
        });
    }

    tracing::debug!(
        pairs = pairing.pairs.len(),
        skipped = pairing.skipped.len(),
        "paired documents"
    );
    Ok(pairing)
}

fn stripped_name(path: &Path) -> String {
    path.file_name()
        .map(|n| strip_date_from_filename(&n.to_string_lossy()))
        .unwrap_or_default()
}

/// Regular files with the given extension (case-insensitive), sorted by name.
fn list_files(dir: &Path, extension: &str) -> EvalResult<Vec<PathBuf>> {
    let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
    let io_error = |e: std::io::Error| EvalError::Io {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let matches = path
            .extension()
            .map_or(false, |e| e.to_string_lossy().to_ascii_lowercase() == wanted);
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_dates_and_extension() {
        assert_eq!(strip_date_from_filename("ABC COMPANY @ 04-01-2024.pdf"), "ABC COMPANY");
        assert_eq!(strip_date_from_filename("ABC COMPANY @ 04-01-2025.pdf"), "ABC COMPANY");
        assert_eq!(strip_date_from_filename("XYZ LLC@4-1-24.txt"), "XYZ LLC");
        assert_eq!(strip_date_from_filename("No Date Here.txt"), "No Date Here");
    }

    #[test]
    fn pairs_by_stripped_name() {
        let root = tempfile::tempdir().unwrap();
        let (exp, ren, truth) = (root.path().join("e"), root.path().join("r"), root.path().join("t"));
        for dir in [&exp, &ren, &truth] {
            fs::create_dir(dir).unwrap();
        }
        fs::write(exp.join("ABC COMPANY @ 04-01-2024.txt"), "x").unwrap();
        fs::write(exp.join("LONELY INC @ 01-01-2024.txt"), "x").unwrap();
        fs::write(exp.join("NO TRUTH CO @ 01-01-2024.txt"), "x").unwrap();
        fs::write(exp.join("ignored.pdf"), "x").unwrap();
        fs::write(ren.join("ABC COMPANY @ 04-01-2025.txt"), "x").unwrap();
        fs::write(ren.join("NO TRUTH CO @ 01-01-2025.txt"), "x").unwrap();
        fs::write(truth.join("ABC COMPANY.json"), "{}").unwrap();
        fs::write(truth.join("LONELY INC.json"), "{}").unwrap();

        let pairing = pair_documents(&exp, &ren, &truth, ".TXT").unwrap();
        assert_eq!(pairing.pairs.len(), 1);
        assert_eq!(pairing.pairs[0].name, "ABC COMPANY");
        assert_eq!(pairing.pairs[0].renewal, ren.join("ABC COMPANY @ 04-01-2025.txt"));

        let skipped: Vec<&str> = pairing.skipped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skipped, vec!["LONELY INC", "NO TRUTH CO"]);
        assert!(pairing.skipped[0].reason.contains("no matching renewal"));
        assert!(pairing.skipped[1].reason.contains("no ground-truth"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let err = pair_documents(&missing, root.path(), root.path(), "txt").unwrap_err();
        assert!(matches!(err, EvalError::Io { .. }));
    }
}
