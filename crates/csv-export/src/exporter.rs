//! Export orchestrator.
//!
//! Drives `Received → Normalizing → Validating → Formatting → Assembling`,
//! or stops at `Rejected` with a [`ValidationReport`]. The pipeline is pure
//! and synchronous: no I/O, no shared state, and the same input always yields
//! the same outcome (apart from the export id and timestamp).

use std::collections::HashSet;
use std::path::Path;

use adiology_core::types::{CampaignStructure, LocationTargetType};
use adiology_core::{ExportConfig, ExportResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::blocks::{self, BlockKind, BlockSet};
use crate::formatters;
use crate::issue::{RejectionStage, ValidationIssue, ValidationReport};
use crate::normalizer::Normalizer;
use crate::validators::Validator;

pub const CSV_MIME_TYPE: &str = "text/csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Received,
    Normalizing,
    Validating,
    Formatting,
    Assembling,
    Completed,
    Rejected,
}

/// Per-entity counts of what a successful export contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub campaigns: usize,
    pub ad_groups: usize,
    pub keywords: usize,
    pub ads: usize,
    pub negative_keywords: usize,
    pub locations: usize,
    pub extensions: usize,
}

impl RowCounts {
    fn from_blocks(blocks: &BlockSet) -> Self {
        let sum = |kinds: &[BlockKind]| -> usize {
            kinds.iter().map(|k| blocks.row_count(*k)).sum()
        };
        Self {
            campaigns: blocks.row_count(BlockKind::Campaigns),
            ad_groups: blocks.row_count(BlockKind::AdGroups),
            keywords: blocks.row_count(BlockKind::Keywords),
            ads: sum(&[
                BlockKind::ResponsiveSearchAds,
                BlockKind::ExpandedTextAds,
                BlockKind::CallOnlyAds,
            ]),
            negative_keywords: sum(&[
                BlockKind::CampaignNegativeKeywords,
                BlockKind::AdGroupNegativeKeywords,
            ]),
            locations: sum(&[
                BlockKind::PostalCodeTargets,
                BlockKind::CityTargets,
                BlockKind::OtherLocationTargets,
            ]),
            extensions: sum(&[
                BlockKind::Sitelinks,
                BlockKind::Callouts,
                BlockKind::StructuredSnippets,
                BlockKind::CallExtensions,
            ]),
        }
    }
}

/// A successful export: the CSV text plus any warnings raised on the way.
#[derive(Debug, Clone, Serialize)]
pub struct CsvExport {
    pub export_id: Uuid,
    pub content: String,
    pub filename: String,
    pub mime_type: &'static str,
    pub warnings: Vec<ValidationIssue>,
    pub row_counts: RowCounts,
    pub generated_at: DateTime<Utc>,
}

impl CsvExport {
    pub fn write_to(&self, path: &Path) -> ExportResult<()> {
        std::fs::write(path, self.content.as_bytes())?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum ExportOutcome {
    Csv(CsvExport),
    Rejected(ValidationReport),
}

impl ExportOutcome {
    pub fn is_csv(&self) -> bool {
        matches!(self, ExportOutcome::Csv(_))
    }

    pub fn into_result(self) -> Result<CsvExport, ValidationReport> {
        match self {
            ExportOutcome::Csv(export) => Ok(export),
            ExportOutcome::Rejected(report) => Err(report),
        }
    }
}

/// Stateless apart from its configuration; one instance can serve any number
/// of concurrent exports.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    config: ExportConfig,
}

impl CsvExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// `export(campaignStructure) → CsvResult | ValidationReport`. `Err` is
    /// reserved for failures writing the CSV itself.
    pub fn export(&self, input: &Value) -> ExportResult<ExportOutcome> {
        self.export_at(input, Utc::now())
    }

    /// Same as [`export`](Self::export) with a fixed generation time.
    pub fn export_at(
        &self,
        input: &Value,
        generated_at: DateTime<Utc>,
    ) -> ExportResult<ExportOutcome> {
        trace_stage(ExportStage::Received);
        trace_stage(ExportStage::Normalizing);
        match Normalizer::new(&self.config).normalize(input) {
            Ok(structure) => self.export_structure_at(&structure, generated_at),
            Err(err) => {
                let issues = err.problems.iter().map(ValidationIssue::from).collect();
                Ok(reject(ValidationReport::new(RejectionStage::Normalization, issues)))
            }
        }
    }

    /// Parses raw JSON text and exports it.
    pub fn export_json(&self, raw: &str) -> ExportResult<ExportOutcome> {
        let input: Value = serde_json::from_str(raw)?;
        self.export(&input)
    }

    /// Exports an already-typed structure, skipping normalization.
    pub fn export_structure(&self, structure: &CampaignStructure) -> ExportResult<ExportOutcome> {
        self.export_structure_at(structure, Utc::now())
    }

    pub fn export_structure_at(
        &self,
        structure: &CampaignStructure,
        generated_at: DateTime<Utc>,
    ) -> ExportResult<ExportOutcome> {
        trace_stage(ExportStage::Validating);
        let issues = Validator::new(&self.config).validate(structure);
        if issues.iter().any(ValidationIssue::is_error) {
            return Ok(reject(ValidationReport::new(RejectionStage::Validation, issues)));
        }

        trace_stage(ExportStage::Formatting);
        let mut blocks = self.format(structure);
        blocks.push(
            BlockKind::UploadNotes,
            formatters::upload_notes_row(&self.config, generated_at),
        );

        trace_stage(ExportStage::Assembling);
        let content = blocks::assemble(&blocks, self.config.include_bom)?;
        let row_counts = RowCounts::from_blocks(&blocks);

        let export = CsvExport {
            export_id: Uuid::new_v4(),
            filename: export_filename(structure),
            mime_type: CSV_MIME_TYPE,
            content,
            warnings: issues,
            row_counts,
            generated_at,
        };
        trace_stage(ExportStage::Completed);
        info!(
            export_id = %export.export_id,
            campaigns = row_counts.campaigns,
            ad_groups = row_counts.ad_groups,
            keywords = row_counts.keywords,
            ads = row_counts.ads,
            locations = row_counts.locations,
            warnings = export.warnings.len(),
            bytes = export.content.len(),
            "CSV export generated"
        );
        Ok(ExportOutcome::Csv(export))
    }

    /// Normalize and validate without producing a CSV.
    pub fn validate(&self, input: &Value) -> ValidationReport {
        match Normalizer::new(&self.config).normalize(input) {
            Ok(structure) => ValidationReport::new(
                RejectionStage::Validation,
                Validator::new(&self.config).validate(&structure),
            ),
            Err(err) => ValidationReport::new(
                RejectionStage::Normalization,
                err.problems.iter().map(ValidationIssue::from).collect(),
            ),
        }
    }

    /// Formats every entity into its block. Duplicate location targets are
    /// emitted once.
    pub fn format(&self, structure: &CampaignStructure) -> BlockSet {
        let mut blocks = BlockSet::new();

        for campaign in &structure.campaigns {
            blocks.push(
                BlockKind::Campaigns,
                formatters::campaign_row(campaign, &self.config),
            );
            blocks.extend(
                BlockKind::CampaignSettings,
                formatters::campaign_settings_rows(campaign, &self.config),
            );
            blocks.extend(BlockKind::Budgets, formatters::budget_rows(campaign));

            for negative in &campaign.negative_keywords {
                blocks.push(
                    BlockKind::CampaignNegativeKeywords,
                    formatters::campaign_negative_row(campaign, negative),
                );
            }

            for group in &campaign.ad_groups {
                blocks.push(BlockKind::AdGroups, formatters::ad_group_row(campaign, group));
                for keyword in &group.keywords {
                    blocks.push(
                        BlockKind::Keywords,
                        formatters::keyword_row(campaign, group, keyword),
                    );
                }
                for negative in &group.negative_keywords {
                    blocks.push(
                        BlockKind::AdGroupNegativeKeywords,
                        formatters::ad_group_negative_row(campaign, group, negative),
                    );
                }
                for ad in &group.ads {
                    let (kind, row) = formatters::ad_row(campaign, group, ad);
                    blocks.push(kind, row);
                }
            }

            for extension in &campaign.extensions {
                let (kind, row) = formatters::extension_row(campaign, extension);
                blocks.push(kind, row);
            }

            let mut seen: HashSet<(LocationTargetType, String)> =
                HashSet::with_capacity(campaign.locations.len());
            for target in &campaign.locations {
                if !seen.insert((target.target_type, target.value.trim().to_lowercase())) {
                    continue;
                }
                let (kind, row) = formatters::location_row(campaign, target);
                blocks.push(kind, row);
            }

            blocks.extend(BlockKind::TrackingTemplates, formatters::tracking_rows(campaign));
        }

        blocks
    }
}

fn trace_stage(stage: ExportStage) {
    debug!(stage = ?stage, "export stage");
}

fn reject(report: ValidationReport) -> ExportOutcome {
    trace_stage(ExportStage::Rejected);
    warn!(
        stage = ?report.stage,
        errors = report.error_count,
        warnings = report.warning_count,
        "export rejected"
    );
    ExportOutcome::Rejected(report)
}

/// `<slugified-first-campaign-name>_export.csv`.
pub fn export_filename(structure: &CampaignStructure) -> String {
    let slug = structure
        .campaigns
        .first()
        .map(|c| slugify(&c.name))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "campaign".to_string());
    format!("{slug}_export.csv")
}

/// Lowercase ASCII alphanumerics separated by single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
