//! Google Ads Editor bulk-CSV export pipeline.
//!
//! Loosely-typed campaign JSON goes through the [`normalizer`], the
//! [`validators`], the row [`formatters`] and the block assembler in
//! [`blocks`]. [`CsvExporter`] ties the stages together and returns either a
//! CSV or a [`ValidationReport`].

pub mod blocks;
pub mod dki;
pub mod exporter;
pub mod formatters;
pub mod issue;
pub mod normalizer;
pub mod validators;

pub use blocks::{BlockKind, BlockSet};
pub use exporter::{CsvExport, CsvExporter, ExportOutcome, ExportStage, RowCounts};
pub use issue::{RejectionStage, Severity, ValidationIssue, ValidationReport};
pub use normalizer::Normalizer;
pub use validators::Validator;
