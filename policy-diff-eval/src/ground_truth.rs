//! Paragraph-level annotations.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{EvalError, EvalResult};

/// Expected change flags for one expiring document, one per paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruth {
    #[serde(default)]
    pub paragraph_changes: Vec<bool>,
}

impl GroundTruth {
    pub fn load(path: &Path) -> EvalResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| EvalError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| EvalError::GroundTruth {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
