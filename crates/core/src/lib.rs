//! Shared campaign model, configuration and error types for the Adiology
//! bulk-CSV exporter.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ExportConfig};
pub use error::{ExportError, ExportResult, NormalizationError, NormalizationProblem, ProblemKind};
