//! Block assembler.
//!
//! A Google Ads Editor bulk file is a sequence of typed blocks. Every export
//! emits all of them in the order of [`BlockKind::ALL`], each as a header row,
//! its data rows, and one blank line. Empty blocks still emit their header so
//! column mapping stays stable across files.

use adiology_core::{ExportError, ExportResult};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;

use crate::formatters::Row;

/// UTF-8 byte-order mark expected by the Google Ads Editor importer.
pub const BOM: &str = "\u{FEFF}";
pub const LINE_ENDING: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Campaigns,
    CampaignSettings,
    Budgets,
    AdGroups,
    Keywords,
    CampaignNegativeKeywords,
    AdGroupNegativeKeywords,
    ResponsiveSearchAds,
    ExpandedTextAds,
    CallOnlyAds,
    ImageAds,
    Sitelinks,
    Callouts,
    StructuredSnippets,
    CallExtensions,
    PriceExtensions,
    AppExtensions,
    PostalCodeTargets,
    CityTargets,
    OtherLocationTargets,
    Audiences,
    AdSchedules,
    DeviceBidAdjustments,
    Labels,
    TrackingTemplates,
    UrlParams,
    UploadNotes,
}

impl BlockKind {
    /// Emission order.
    pub const ALL: [BlockKind; 27] = [
        BlockKind::Campaigns,
        BlockKind::CampaignSettings,
        BlockKind::Budgets,
        BlockKind::AdGroups,
        BlockKind::Keywords,
        BlockKind::CampaignNegativeKeywords,
        BlockKind::AdGroupNegativeKeywords,
        BlockKind::ResponsiveSearchAds,
        BlockKind::ExpandedTextAds,
        BlockKind::CallOnlyAds,
        BlockKind::ImageAds,
        BlockKind::Sitelinks,
        BlockKind::Callouts,
        BlockKind::StructuredSnippets,
        BlockKind::CallExtensions,
        BlockKind::PriceExtensions,
        BlockKind::AppExtensions,
        BlockKind::PostalCodeTargets,
        BlockKind::CityTargets,
        BlockKind::OtherLocationTargets,
        BlockKind::Audiences,
        BlockKind::AdSchedules,
        BlockKind::DeviceBidAdjustments,
        BlockKind::Labels,
        BlockKind::TrackingTemplates,
        BlockKind::UrlParams,
        BlockKind::UploadNotes,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            BlockKind::Campaigns => "Campaigns",
            BlockKind::CampaignSettings => "Campaign Settings",
            BlockKind::Budgets => "Budgets",
            BlockKind::AdGroups => "Ad Groups",
            BlockKind::Keywords => "Keywords",
            BlockKind::CampaignNegativeKeywords => "Campaign Negative Keywords",
            BlockKind::AdGroupNegativeKeywords => "Ad Group Negative Keywords",
            BlockKind::ResponsiveSearchAds => "Responsive Search Ads",
            BlockKind::ExpandedTextAds => "DKI / Expanded Text Ads",
            BlockKind::CallOnlyAds => "Call-Only Ads",
            BlockKind::ImageAds => "Image Ads",
            BlockKind::Sitelinks => "Sitelinks",
            BlockKind::Callouts => "Callouts",
            BlockKind::StructuredSnippets => "Structured Snippets",
            BlockKind::CallExtensions => "Call Extensions",
            BlockKind::PriceExtensions => "Price Extensions",
            BlockKind::AppExtensions => "App Extensions",
            BlockKind::PostalCodeTargets => "Postal Code Targets",
            BlockKind::CityTargets => "City Targets",
            BlockKind::OtherLocationTargets => "Other Location Targets",
            BlockKind::Audiences => "Audiences",
            BlockKind::AdSchedules => "Ad Schedule",
            BlockKind::DeviceBidAdjustments => "Device Bid Adjustments",
            BlockKind::Labels => "Labels",
            BlockKind::TrackingTemplates => "Tracking Templates",
            BlockKind::UrlParams => "URL Params",
            BlockKind::UploadNotes => "Upload Notes",
        }
    }

    /// Column names, in order. Every header line in a file is distinct.
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            BlockKind::Campaigns => &[
                "Campaign",
                "Campaign Status",
                "Campaign Type",
                "Networks",
                "Daily Budget",
                "Budget Type",
                "Start Date",
                "End Date",
                "Bid Strategy Type",
                "Campaign URL Options (Tracking Template)",
                "Final URL Suffix",
                "Campaign Language",
            ],
            BlockKind::CampaignSettings => &["Campaign", "Setting", "Value"],
            BlockKind::Budgets => &["Budget", "Budget Amount", "Delivery Method", "Budget ID"],
            BlockKind::AdGroups => &[
                "Campaign",
                "Ad Group",
                "Ad Group Status",
                "CPC Bid",
                "Ad Group Default Max CPC",
                "Ad Group Type",
            ],
            BlockKind::Keywords => &[
                "Campaign",
                "Ad Group",
                "Keyword",
                "Criterion Type",
                "Max CPC",
                "Final URL",
                "Status",
                "Custom Parameter",
            ],
            BlockKind::CampaignNegativeKeywords => &["Campaign", "Negative Keyword", "Match Type"],
            BlockKind::AdGroupNegativeKeywords => {
                &["Campaign", "Ad Group", "Negative Keyword", "Match Type"]
            }
            BlockKind::ResponsiveSearchAds => &[
                "Campaign",
                "Ad Group",
                "Ad Type",
                "Ad Status",
                "Final URL",
                "Final Mobile URL",
                "Headline 1",
                "Headline 2",
                "Headline 3",
                "Headline 4",
                "Headline 5",
                "Headline 6",
                "Headline 7",
                "Headline 8",
                "Headline 9",
                "Headline 10",
                "Headline 11",
                "Headline 12",
                "Headline 13",
                "Headline 14",
                "Headline 15",
                "Description 1",
                "Description 2",
                "Description 3",
                "Description 4",
                "Path 1",
                "Path 2",
                "Ad Rotation",
            ],
            BlockKind::ExpandedTextAds => &[
                "Campaign",
                "Ad Group",
                "Ad Type",
                "Ad Status",
                "Final URL",
                "Headline 1",
                "Headline 2",
                "Headline 3",
                "Description 1",
                "Description 2",
                "Path 1",
                "Path 2",
            ],
            BlockKind::CallOnlyAds => &[
                "Campaign",
                "Ad Group",
                "Ad Type",
                "Ad Status",
                "Business Name",
                "Phone Number",
                "Country Code",
                "Headline 1",
                "Headline 2",
                "Description 1",
                "Description 2",
                "Verification URL",
            ],
            BlockKind::ImageAds => &[
                "Campaign",
                "Ad Group",
                "Ad Type",
                "Ad Status",
                "Image URL",
                "Alt Text",
                "Final URL",
            ],
            BlockKind::Sitelinks => &[
                "Campaign",
                "Sitelink Text",
                "Description Line 1",
                "Description Line 2",
                "Final URL",
                "Device Preference",
                "Start Date",
                "End Date",
                "Status",
            ],
            BlockKind::Callouts => &[
                "Campaign",
                "Callout Text",
                "Start Date",
                "End Date",
                "Device Preference",
                "Status",
            ],
            BlockKind::StructuredSnippets => {
                &["Campaign", "Header", "Values", "Start Date", "End Date", "Status"]
            }
            BlockKind::CallExtensions => &[
                "Campaign",
                "Phone Number",
                "Country Code",
                "Phone Verification",
                "Device Preference",
                "Start Date",
                "End Date",
                "Status",
            ],
            BlockKind::PriceExtensions => &[
                "Campaign",
                "Price Extension Type",
                "Header",
                "Price Qualifier",
                "Price",
                "Final URL",
                "Currency",
                "Start Date",
                "End Date",
                "Status",
            ],
            BlockKind::AppExtensions => &[
                "Campaign",
                "App Platform",
                "App ID",
                "Final URL",
                "Start Date",
                "End Date",
                "Status",
            ],
            BlockKind::PostalCodeTargets => {
                &["Campaign", "Location Target", "Target Type", "Bid Adjustment"]
            }
            BlockKind::CityTargets => &["Campaign", "City", "Target Type", "Bid Adjustment"],
            BlockKind::OtherLocationTargets => {
                &["Campaign", "Location", "Target Type", "Bid Adjustment"]
            }
            BlockKind::Audiences => &[
                "Campaign",
                "Ad Group",
                "Audience Name",
                "Audience Type",
                "Bid Adjustment",
                "Status",
            ],
            BlockKind::AdSchedules => &[
                "Campaign",
                "Ad Schedule",
                "Start Hour",
                "End Hour",
                "Start Minute",
                "End Minute",
                "Day of Week",
                "Bid Modifier",
            ],
            BlockKind::DeviceBidAdjustments => &["Campaign", "Device", "Bid Adjustment"],
            BlockKind::Labels => &["Campaign", "Ad Group", "Ad/Keyword/Asset", "Label Name"],
            BlockKind::TrackingTemplates => &["Campaign", "Tracking Template", "Final URL Suffix"],
            BlockKind::UrlParams => &["Campaign", "Ad Group", "Param", "Value"],
            BlockKind::UploadNotes => &["Upload Notes", "Generated By", "Generation Timestamp"],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Formatted rows grouped by block.
#[derive(Debug, Clone)]
pub struct BlockSet {
    rows: Vec<Vec<Row>>,
}

impl Default for BlockSet {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSet {
    pub fn new() -> Self {
        Self {
            rows: vec![Vec::new(); BlockKind::ALL.len()],
        }
    }

    pub fn push(&mut self, kind: BlockKind, row: Row) {
        debug_assert_eq!(row.len(), kind.headers().len(), "{} row width", kind.display_name());
        self.rows[kind.index()].push(row);
    }

    pub fn extend(&mut self, kind: BlockKind, rows: impl IntoIterator<Item = Row>) {
        for row in rows {
            self.push(kind, row);
        }
    }

    pub fn rows(&self, kind: BlockKind) -> &[Row] {
        &self.rows[kind.index()]
    }

    pub fn row_count(&self, kind: BlockKind) -> usize {
        self.rows[kind.index()].len()
    }

    pub fn total_rows(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Emit every block in order: header, rows, one blank line. Header cells are
/// always quoted; data cells only when they contain a delimiter, quote or
/// line break.
pub fn assemble(blocks: &BlockSet, include_bom: bool) -> ExportResult<String> {
    let estimate = blocks.total_rows() * 48 + BlockKind::ALL.len() * 96;
    let mut out: Vec<u8> = Vec::with_capacity(estimate);
    if include_bom {
        out.extend_from_slice(BOM.as_bytes());
    }

    for kind in BlockKind::ALL {
        write_records(&mut out, QuoteStyle::Always, [kind.headers()])?;
        write_records(&mut out, QuoteStyle::Necessary, blocks.rows(kind))?;
        out.extend_from_slice(LINE_ENDING.as_bytes());
    }

    String::from_utf8(out).map_err(|e| ExportError::Internal(e.into()))
}

/// Writes records of one width with CRLF terminators.
fn write_records<I, R, F>(out: &mut Vec<u8>, quote_style: QuoteStyle, records: I) -> csv::Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(quote_style)
        .terminator(Terminator::CRLF)
        .from_writer(&mut *out);
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn header_line(kind: BlockKind) -> String {
        kind.headers()
            .iter()
            .map(|h| format!("\"{h}\""))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_header_lines_are_unique() {
        let lines: HashSet<String> = BlockKind::ALL.iter().map(|k| header_line(*k)).collect();
        assert_eq!(lines.len(), BlockKind::ALL.len());
    }

    #[test]
    fn test_all_is_in_declaration_order() {
        for (i, kind) in BlockKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_empty_blocks_emit_header_and_blank_line() {
        let csv = assemble(&BlockSet::new(), false).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").collect();
        // header + blank per block, plus the empty tail after the final CRLF
        assert_eq!(lines.len(), BlockKind::ALL.len() * 2 + 1);
        assert_eq!(lines[0], header_line(BlockKind::Campaigns));
        assert_eq!(lines[1], "");
        assert_eq!(lines[lines.len() - 3], header_line(BlockKind::UploadNotes));
        assert!(csv.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_bom_and_rows() {
        let mut blocks = BlockSet::new();
        blocks.push(
            BlockKind::CampaignNegativeKeywords,
            row(&["Locks", "free", "Negative Broad"]),
        );
        let csv = assemble(&blocks, true).unwrap();
        assert!(csv.starts_with(BOM));
        let header = header_line(BlockKind::CampaignNegativeKeywords);
        assert!(csv.contains(&format!("{header}\r\nLocks,free,Negative Broad\r\n\r\n")));
        assert_eq!(blocks.total_rows(), 1);
    }

    #[test]
    fn test_header_row_quotes_every_column() {
        let csv = assemble(&BlockSet::new(), false).unwrap();
        assert!(csv.contains("\r\n\"Campaign\",\"Setting\",\"Value\"\r\n"));
    }

    #[test]
    fn test_data_cells_quoted_only_when_needed() {
        let mut blocks = BlockSet::new();
        blocks.push(
            BlockKind::CampaignNegativeKeywords,
            row(&["Locks, Keys", "say \"hi\"", "two\nlines"]),
        );
        blocks.push(BlockKind::CampaignNegativeKeywords, row(&["plain", "", "A\rB"]));
        let csv = assemble(&blocks, false).unwrap();
        assert!(csv.contains("\r\n\"Locks, Keys\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n"));
        assert!(csv.contains("\r\nplain,,\"A\rB\"\r\n"));
    }
}
