//! Row formatters: one semantic entity in, CSV rows out.
//!
//! Every function here is pure. Cells hold raw text; quoting happens when the
//! block assembler writes them out.

use adiology_core::types::{
    Ad, AdGroup, CallOnlyAd, Campaign, DynamicKeywordAd, Extension, Keyword, LocationTarget,
    LocationTargetType, NegativeKeyword, ResponsiveSearchAd,
};
use adiology_core::ExportConfig;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::blocks::BlockKind;

/// One CSV row of unescaped cells.
pub type Row = Vec<String>;

const CAMPAIGN_TYPE: &str = "Search";
const NETWORKS: &str = "Search Network";
const AD_GROUP_TYPE: &str = "Standard";
const DELIVERY_METHOD: &str = "Standard";
const ENABLED: &str = "Enabled";
const RSA_HEADLINE_COLUMNS: usize = 15;
const RSA_DESCRIPTION_COLUMNS: usize = 4;

/// Builds a [`Row`] from cells of any string-like type.
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        vec![$(AsRef::<str>::as_ref(&$cell).to_owned()),*]
    };
}

fn owned(cells: &[&str]) -> Row {
    cells.iter().map(|c| c.to_string()).collect()
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// `20` → `20%`, `-12.5` → `-12.5%`.
pub fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{}%", v as i64),
        Some(v) => format!("{v}%"),
        None => String::new(),
    }
}

/// Pads `lines` with blanks up to `width` and drops anything beyond it.
fn columns(lines: &[String], width: usize) -> Vec<&str> {
    (0..width)
        .map(|i| lines.get(i).map(String::as_str).unwrap_or(""))
        .collect()
}

// ─── Campaign level ─────────────────────────────────────────────────────────

pub fn campaign_row(campaign: &Campaign, config: &ExportConfig) -> Row {
    row![
        &campaign.name,
        campaign.status.display_name(),
        CAMPAIGN_TYPE,
        NETWORKS,
        &money(campaign.budget),
        campaign.budget_type.display_name(),
        &date(campaign.start_date),
        &date(campaign.end_date),
        campaign.bidding_strategy.display_name(),
        campaign.tracking_template.as_deref().unwrap_or(""),
        campaign.final_url_suffix.as_deref().unwrap_or(""),
        language(campaign, config),
    ]
}

pub fn campaign_settings_rows(campaign: &Campaign, config: &ExportConfig) -> Vec<Row> {
    vec![
        row![&campaign.name, "Languages", language(campaign, config)],
        row![&campaign.name, "Networks", NETWORKS],
    ]
}

/// A budget row only exists for campaigns that carry a budget.
pub fn budget_rows(campaign: &Campaign) -> Vec<Row> {
    match campaign.budget {
        Some(_) => vec![row![
            &format!("{} Budget", campaign.name),
            &money(campaign.budget),
            DELIVERY_METHOD,
            "",
        ]],
        None => Vec::new(),
    }
}

pub fn campaign_negative_row(campaign: &Campaign, negative: &NegativeKeyword) -> Row {
    row![
        &campaign.name,
        &negative.text,
        negative.match_type.display_name(),
    ]
}

pub fn tracking_rows(campaign: &Campaign) -> Vec<Row> {
    if campaign.tracking_template.is_none() && campaign.final_url_suffix.is_none() {
        return Vec::new();
    }
    vec![row![
        &campaign.name,
        campaign.tracking_template.as_deref().unwrap_or(""),
        campaign.final_url_suffix.as_deref().unwrap_or(""),
    ]]
}

fn language<'a>(campaign: &'a Campaign, config: &'a ExportConfig) -> &'a str {
    campaign
        .language
        .as_deref()
        .unwrap_or(config.default_language.as_str())
}

// ─── Ad group level ─────────────────────────────────────────────────────────

pub fn ad_group_row(campaign: &Campaign, group: &AdGroup) -> Row {
    let cpc = money(group.default_max_cpc);
    row![
        &campaign.name,
        &group.name,
        group.status.display_name(),
        &cpc,
        &cpc,
        AD_GROUP_TYPE,
    ]
}

/// Keyword text is stored without match-type punctuation; the match type
/// goes to the Criterion Type column.
pub fn keyword_row(campaign: &Campaign, group: &AdGroup, keyword: &Keyword) -> Row {
    row![
        &campaign.name,
        &group.name,
        &keyword.text,
        keyword.match_type.display_name(),
        &money(keyword.max_cpc),
        keyword.final_url.as_deref().unwrap_or(""),
        group.status.display_name(),
        "",
    ]
}

pub fn ad_group_negative_row(campaign: &Campaign, group: &AdGroup, negative: &NegativeKeyword) -> Row {
    row![
        &campaign.name,
        &group.name,
        &negative.text,
        negative.match_type.display_name(),
    ]
}

// ─── Ads ────────────────────────────────────────────────────────────────────

/// Formats an ad into the block for its type.
pub fn ad_row(campaign: &Campaign, group: &AdGroup, ad: &Ad) -> (BlockKind, Row) {
    match ad {
        Ad::ResponsiveSearch(rsa) => (
            BlockKind::ResponsiveSearchAds,
            responsive_search_ad_row(campaign, group, ad, rsa),
        ),
        Ad::DynamicKeyword(dki) => (
            BlockKind::ExpandedTextAds,
            expanded_text_ad_row(campaign, group, ad, dki),
        ),
        Ad::CallOnly(call) => (BlockKind::CallOnlyAds, call_only_ad_row(campaign, group, ad, call)),
    }
}

fn responsive_search_ad_row(
    campaign: &Campaign,
    group: &AdGroup,
    ad: &Ad,
    rsa: &ResponsiveSearchAd,
) -> Row {
    let mut cells: Vec<&str> = vec![
        campaign.name.as_str(),
        group.name.as_str(),
        ad.kind().display_name(),
        ad.status().display_name(),
        rsa.final_url.as_str(),
        rsa.final_mobile_url.as_deref().unwrap_or(""),
    ];
    cells.extend(columns(&rsa.headlines, RSA_HEADLINE_COLUMNS));
    cells.extend(columns(&rsa.descriptions, RSA_DESCRIPTION_COLUMNS));
    cells.push(rsa.path1.as_deref().unwrap_or(""));
    cells.push(rsa.path2.as_deref().unwrap_or(""));
    cells.push("");
    owned(&cells)
}

fn expanded_text_ad_row(
    campaign: &Campaign,
    group: &AdGroup,
    ad: &Ad,
    dki: &DynamicKeywordAd,
) -> Row {
    let mut cells: Vec<&str> = vec![
        campaign.name.as_str(),
        group.name.as_str(),
        ad.kind().display_name(),
        ad.status().display_name(),
        dki.final_url.as_str(),
    ];
    cells.extend(columns(&dki.headlines, DynamicKeywordAd::MAX_HEADLINES));
    cells.extend(columns(&dki.descriptions, DynamicKeywordAd::MAX_DESCRIPTIONS));
    cells.push(dki.path1.as_deref().unwrap_or(""));
    cells.push(dki.path2.as_deref().unwrap_or(""));
    owned(&cells)
}

fn call_only_ad_row(campaign: &Campaign, group: &AdGroup, ad: &Ad, call: &CallOnlyAd) -> Row {
    let mut cells: Vec<&str> = vec![
        campaign.name.as_str(),
        group.name.as_str(),
        ad.kind().display_name(),
        ad.status().display_name(),
        call.business_name.as_str(),
        call.phone_number.as_str(),
        call.country_code.as_str(),
    ];
    cells.extend(columns(&call.headlines, CallOnlyAd::MAX_HEADLINES));
    cells.extend(columns(&call.descriptions, CallOnlyAd::MAX_DESCRIPTIONS));
    cells.push(call.verification_url.as_deref().unwrap_or(""));
    owned(&cells)
}

// ─── Extensions and targeting ───────────────────────────────────────────────

pub fn extension_row(campaign: &Campaign, extension: &Extension) -> (BlockKind, Row) {
    match extension {
        Extension::Sitelink(link) => (
            BlockKind::Sitelinks,
            row![
                &campaign.name,
                &link.text,
                link.description1.as_deref().unwrap_or(""),
                link.description2.as_deref().unwrap_or(""),
                &link.final_url,
                "",
                "",
                "",
                ENABLED,
            ],
        ),
        Extension::Callout(callout) => (
            BlockKind::Callouts,
            row![&campaign.name, &callout.text, "", "", "", ENABLED],
        ),
        Extension::StructuredSnippet(snippet) => (
            BlockKind::StructuredSnippets,
            row![
                &campaign.name,
                &snippet.header,
                &snippet.values.join(";"),
                "",
                "",
                ENABLED,
            ],
        ),
        Extension::Call(call) => (
            BlockKind::CallExtensions,
            row![
                &campaign.name,
                &call.phone_number,
                &call.country_code,
                "",
                "",
                "",
                "",
                ENABLED,
            ],
        ),
    }
}

/// Postal codes and cities get their own blocks; states and countries share
/// the generic location block.
pub fn location_row(campaign: &Campaign, target: &LocationTarget) -> (BlockKind, Row) {
    let kind = match target.target_type {
        LocationTargetType::PostalCode => BlockKind::PostalCodeTargets,
        LocationTargetType::City => BlockKind::CityTargets,
        LocationTargetType::State | LocationTargetType::Country => BlockKind::OtherLocationTargets,
    };
    (
        kind,
        row![
            &campaign.name,
            target.value.trim(),
            target.target_type.display_name(),
            &percent(target.bid_adjustment),
        ],
    )
}

/// Terminal block row: generator identity and an ISO-8601 UTC timestamp.
pub fn upload_notes_row(config: &ExportConfig, generated_at: DateTime<Utc>) -> Row {
    row![
        &format!("Generated by {}", config.generator_name),
        &config.generator_version,
        &generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use adiology_core::types::{CallExtension, EntityStatus, MatchType, StructuredSnippet};
    use chrono::TimeZone;

    fn sample_campaign() -> Campaign {
        let mut campaign = Campaign::named("Test Campaign - Locksmith Services");
        campaign.budget = Some(100.0);
        campaign
    }

    fn sample_group() -> AdGroup {
        AdGroup::named("Emergency Locksmith")
    }

    #[test]
    fn test_campaign_row() {
        let config = ExportConfig::default();
        let cells = campaign_row(&sample_campaign(), &config);
        assert_eq!(cells.len(), BlockKind::Campaigns.headers().len());
        assert_eq!(cells[0], "Test Campaign - Locksmith Services");
        assert_eq!(cells[4], "100.00");
        assert_eq!(cells[8], "Manual CPC");
        assert_eq!(cells[11], "en");
    }

    #[test]
    fn test_keyword_row_uses_criterion_type() {
        let keyword = Keyword::new("emergency plumber", MatchType::Phrase);
        let cells = keyword_row(&sample_campaign(), &sample_group(), &keyword);
        assert_eq!(cells.len(), BlockKind::Keywords.headers().len());
        assert_eq!(cells[2], "emergency plumber");
        assert_eq!(cells[3], "Phrase");
    }

    #[test]
    fn test_negative_rows_use_prefixed_match_type() {
        let campaign = sample_campaign();
        let group = sample_group();
        for mt in MatchType::NEGATIVE {
            let negative = NegativeKeyword::new("free", mt);
            let cells = campaign_negative_row(&campaign, &negative);
            assert!(cells[2].starts_with("Negative "));
            let cells = ad_group_negative_row(&campaign, &group, &negative);
            assert!(cells[3].starts_with("Negative "));
            assert!(!cells[3].contains("(Negative)"));
        }
    }

    #[test]
    fn test_rsa_row_pads_copy_columns() {
        let ad = Ad::ResponsiveSearch(ResponsiveSearchAd {
            headlines: vec!["One".into(), "Two, with comma".into(), "Three".into()],
            descriptions: vec!["Desc".into()],
            final_url: "https://example.com".into(),
            ..Default::default()
        });
        let (kind, cells) = ad_row(&sample_campaign(), &sample_group(), &ad);
        assert_eq!(kind, BlockKind::ResponsiveSearchAds);
        assert_eq!(cells.len(), kind.headers().len());
        assert_eq!(cells[2], "Responsive search ad");
        assert_eq!(cells[7], "Two, with comma");
        assert_eq!(cells[21], "Desc");
        assert_eq!(cells[9], "");
    }

    #[test]
    fn test_dki_row_truncates_to_three_headlines() {
        let ad = Ad::DynamicKeyword(DynamicKeywordAd {
            headlines: (1..=5).map(|i| format!("{{KeyWord:Lock {i}}}")).collect(),
            descriptions: vec!["D1".into(), "D2".into(), "D3".into()],
            final_url: "https://example.com".into(),
            ..Default::default()
        });
        let (kind, cells) = ad_row(&sample_campaign(), &sample_group(), &ad);
        assert_eq!(kind, BlockKind::ExpandedTextAds);
        assert_eq!(cells.len(), kind.headers().len());
        assert_eq!(cells[7], "{KeyWord:Lock 3}");
        assert_eq!(cells[9], "D2");
    }

    #[test]
    fn test_call_only_row() {
        let ad = Ad::CallOnly(CallOnlyAd {
            business_name: "Acme Locks".into(),
            phone_number: "555-0100".into(),
            country_code: "US".into(),
            headlines: vec!["Call Now".into()],
            status: EntityStatus::Paused,
            ..Default::default()
        });
        let (kind, cells) = ad_row(&sample_campaign(), &sample_group(), &ad);
        assert_eq!(kind, BlockKind::CallOnlyAds);
        assert_eq!(cells.len(), kind.headers().len());
        assert_eq!(cells[3], "Paused");
        assert_eq!(cells[5], "555-0100");
        assert_eq!(cells[7], "Call Now");
    }

    #[test]
    fn test_extension_rows_match_headers() {
        let campaign = sample_campaign();
        let snippet = Extension::StructuredSnippet(StructuredSnippet {
            header: "Services".into(),
            values: vec!["Rekeying".into(), "Lockouts".into()],
        });
        let (kind, cells) = extension_row(&campaign, &snippet);
        assert_eq!(kind, BlockKind::StructuredSnippets);
        assert_eq!(cells.len(), kind.headers().len());
        assert_eq!(cells[2], "Rekeying;Lockouts");

        let call = Extension::Call(CallExtension {
            phone_number: "555-0100".into(),
            country_code: "US".into(),
        });
        let (kind, cells) = extension_row(&campaign, &call);
        assert_eq!(cells.len(), kind.headers().len());
    }

    #[test]
    fn test_location_rows_route_by_type() {
        let campaign = sample_campaign();
        let mut zip = LocationTarget::new(LocationTargetType::PostalCode, "90210");
        zip.bid_adjustment = Some(20.0);
        let (kind, cells) = location_row(&campaign, &zip);
        assert_eq!(kind, BlockKind::PostalCodeTargets);
        assert_eq!(cells[2], "Postal Code");
        assert_eq!(cells[3], "20%");

        let city = LocationTarget::new(LocationTargetType::City, "Austin");
        assert_eq!(location_row(&campaign, &city).0, BlockKind::CityTargets);
        let state = LocationTarget::new(LocationTargetType::State, "Texas");
        assert_eq!(location_row(&campaign, &state).0, BlockKind::OtherLocationTargets);
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(percent(Some(20.0)), "20%");
        assert_eq!(percent(Some(-12.5)), "-12.5%");
        assert_eq!(percent(None), "");
    }

    #[test]
    fn test_upload_notes_row() {
        let config = ExportConfig::default();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let cells = upload_notes_row(&config, at);
        assert_eq!(cells[0], "Generated by Adiology Campaign Dashboard");
        assert_eq!(cells[1], "CSV Generator V3");
        assert_eq!(cells[2], "2026-03-01T12:30:00.000Z");
    }

    #[test]
    fn test_budget_rows_only_when_budget_present() {
        let campaign = sample_campaign();
        let rows = budget_rows(&campaign);
        assert_eq!(rows[0][0], "Test Campaign - Locksmith Services Budget");
        assert_eq!(rows[0][1], "100.00");
        assert!(budget_rows(&Campaign::named("No budget")).is_empty());
    }
}
