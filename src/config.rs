//! TOML configuration.
//!
//! Every field has a default, so an empty or missing file yields a working
//! exact-text comparison with the offline hashing encoder.
//!
//! ```toml
//! policy = "threshold"
//! threshold = 0.9
//! alignment = "optimal"
//!
//! [encoder]
//! kind = "http"
//! endpoint = "http://localhost:8080/v1"
//! model = "text-embedding-3-small"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [report]
//! wrap_column = 100
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{ChangeClassifier, ComparisonPolicy, DEFAULT_THRESHOLD};
use crate::diff::DiffRenderer;
use crate::encoder::{Encoder, HashingEncoder, HttpEncoder};
use crate::errors::{DiffError, DiffResult};
use crate::report::{ReportAssembler, DEFAULT_TITLE};
use crate::similarity::{AlignmentKind, SimilarityMatcher};

/// Policy name as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Exact,
    Threshold,
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(PolicyKind::Exact),
            "threshold" => Ok(PolicyKind::Threshold),
            other => Err(format!("unknown comparison policy: {}", other)),
        }
    }
}

fn default_dimensions() -> usize {
    512
}

fn default_timeout_secs() -> u64 {
    30
}

/// Which encoder backs the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EncoderConfig {
    Hashing {
        #[serde(default = "default_dimensions")]
        dimensions: usize,
    },
    Http {
        /// API root; `/embeddings` is appended
        endpoint: String,
        model: String,
        /// Environment variable holding the bearer token
        #[serde(default)]
        api_key_env: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig::Hashing {
            dimensions: default_dimensions(),
        }
    }
}

/// Report layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub wrap_column: usize,
    pub context_lines: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            wrap_column: 80,
            context_lines: 3,
        }
    }
}

/// Top-level comparison settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub policy: PolicyKind,
    pub threshold: f64,
    pub alignment: AlignmentKind,
    pub encoder: EncoderConfig,
    pub report: ReportConfig,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            threshold: DEFAULT_THRESHOLD,
            alignment: AlignmentKind::default(),
            encoder: EncoderConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl DiffConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> DiffResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_existing(path)
    }

    /// Load from a TOML file the caller named explicitly. A missing file is
    /// an error, never a silent switch to the defaults.
    pub fn load_existing(path: &Path) -> DiffResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DiffError::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> DiffResult<Self> {
        let config: DiffConfig = toml::from_str(content).map_err(|e| DiffError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DiffResult<()> {
        ComparisonPolicy::threshold(self.threshold)?;
        if let EncoderConfig::Http {
            endpoint, model, ..
        } = &self.encoder
        {
            if endpoint.trim().is_empty() || model.trim().is_empty() {
                return Err(DiffError::Config {
                    message: "http encoder needs both endpoint and model".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn comparison_policy(&self) -> DiffResult<ComparisonPolicy> {
        match self.policy {
            PolicyKind::Exact => Ok(ComparisonPolicy::ExactText),
            PolicyKind::Threshold => ComparisonPolicy::threshold(self.threshold),
        }
    }

    pub fn classifier(&self) -> DiffResult<ChangeClassifier> {
        Ok(ChangeClassifier::new(self.comparison_policy()?))
    }

    pub fn matcher(&self) -> SimilarityMatcher {
        SimilarityMatcher::with_strategy(self.alignment.strategy())
    }

    pub fn renderer(&self) -> DiffRenderer {
        DiffRenderer {
            context_lines: self.report.context_lines,
            wrap_column: self.report.wrap_column,
        }
    }

    pub fn assembler(&self) -> ReportAssembler {
        ReportAssembler::new(self.report.title.clone(), self.renderer())
    }

    /// Construct the configured encoder. The HTTP key is read from the
    /// environment here, never stored in the file.
    pub fn build_encoder(&self) -> DiffResult<Box<dyn Encoder>> {
        match &self.encoder {
            EncoderConfig::Hashing { dimensions } => Ok(Box::new(HashingEncoder::new(*dimensions))),
            EncoderConfig::Http {
                endpoint,
                model,
                api_key_env,
                timeout_secs,
            } => {
                let api_key = match api_key_env {
                    Some(var) => Some(std::env::var(var).map_err(|_| DiffError::Config {
                        message: format!("environment variable {} is not set", var),
                    })?),
                    None => None,
                };
                Ok(Box::new(HttpEncoder::new(
                    endpoint,
                    model.clone(),
                    api_key,
                    Duration::from_secs(*timeout_secs),
                )))
            }
        }
    }
}
