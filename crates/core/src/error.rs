use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Why a field could not be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// A required key is absent, null or blank.
    Missing,
    /// A key or enumerated value the exporter does not know.
    Unrecognized,
    /// The value is present but has the wrong shape (e.g. text where a
    /// number is required).
    InvalidValue,
}

/// One structural defect found while normalizing loosely-typed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationProblem {
    /// Dotted path into the input, e.g. `campaigns[0].ad_groups[1].ads[2].type`.
    pub path: String,
    pub kind: ProblemKind,
    pub message: String,
}

/// The input could not be turned into a campaign structure. Carries every
/// problem found, not just the first.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("campaign structure could not be normalized ({} problem(s)): {}", .problems.len(), summarize(.problems))]
pub struct NormalizationError {
    pub problems: Vec<NormalizationProblem>,
}

impl NormalizationError {
    pub fn new(problems: Vec<NormalizationProblem>) -> Self {
        Self { problems }
    }
}

fn summarize(problems: &[NormalizationProblem]) -> String {
    problems
        .iter()
        .take(3)
        .map(|p| format!("{}: {}", p.path, p.message))
        .collect::<Vec<_>>()
        .join("; ")
}
