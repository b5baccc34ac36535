//! Validation issues and the report handed back when an export is blocked.

use adiology_core::{NormalizationProblem, ProblemKind};
use serde::{Deserialize, Serialize};

/// Errors block an export; warnings travel alongside a successful CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One finding about one field. Produced by validators, surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Dotted path to the offending field, e.g. `campaigns[0].ad_groups[1].ads[0].headline_2`.
    pub field: String,
    /// Position of the offending entity within its parent list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, row_index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.into(),
            row_index,
            message: message.into(),
        }
    }

    pub fn warning(
        field: impl Into<String>,
        row_index: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.into(),
            row_index,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&NormalizationProblem> for ValidationIssue {
    fn from(problem: &NormalizationProblem) -> Self {
        let prefix = match problem.kind {
            ProblemKind::Missing => "Missing",
            ProblemKind::Unrecognized => "Unrecognized",
            ProblemKind::InvalidValue => "Invalid value",
        };
        ValidationIssue::error(
            problem.path.clone(),
            None,
            format!("{prefix}: {}", problem.message),
        )
    }
}

/// Pipeline stage at which an export was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionStage {
    Normalization,
    Validation,
}

/// Structured issue report returned instead of a CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub stage: RejectionStage,
    pub issues: Vec<ValidationIssue>,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ValidationReport {
    pub fn new(stage: RejectionStage, issues: Vec<ValidationIssue>) -> Self {
        let error_count = issues.iter().filter(|i| i.is_error()).count();
        let warning_count = issues.len() - error_count;
        Self {
            stage,
            issues,
            error_count,
            warning_count,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// Numbered, human-readable listing: errors first, then warnings.
    pub fn render(&self) -> String {
        render_issues(&self.issues)
    }
}

/// Renders issues as the two numbered sections shown to end users.
pub fn render_issues(issues: &[ValidationIssue]) -> String {
    let mut lines: Vec<String> = Vec::new();

    let errors: Vec<&ValidationIssue> = issues.iter().filter(|i| i.is_error()).collect();
    let warnings: Vec<&ValidationIssue> = issues.iter().filter(|i| !i.is_error()).collect();

    if !errors.is_empty() {
        lines.push("ERRORS (must fix before export):".to_string());
        lines.push(String::new());
        for (n, issue) in errors.iter().enumerate() {
            lines.push(format!("{}. {} [{}]", n + 1, issue.message, issue.field));
        }
    }

    if !warnings.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("WARNINGS (recommended to fix):".to_string());
        lines.push(String::new());
        for (n, issue) in warnings.iter().enumerate() {
            lines.push(format!("{}. {} [{}]", n + 1, issue.message, issue.field));
        }
    }

    lines.join("\n")
}
