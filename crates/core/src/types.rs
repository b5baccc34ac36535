//! Canonical campaign model consumed by the bulk-CSV exporter.
//!
//! A [`CampaignStructure`] owns its campaigns, and each [`Campaign`] owns every
//! nested entity (ad groups, keywords, ads, negatives, location targets,
//! extensions). Nothing is shared between two campaigns, and the exporter only
//! ever reads the tree.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Structure ──────────────────────────────────────────────────────────────

/// One export request: every campaign that ends up in a single CSV file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignStructure {
    pub campaigns: Vec<Campaign>,
}

impl CampaignStructure {
    pub fn ad_group_count(&self) -> usize {
        self.campaigns.iter().map(|c| c.ad_groups.len()).sum()
    }

    pub fn keyword_count(&self) -> usize {
        self.campaigns
            .iter()
            .flat_map(|c| &c.ad_groups)
            .map(|g| g.keywords.len())
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    #[default]
    Enabled,
    Paused,
}

impl EntityStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityStatus::Enabled => "Enabled",
            EntityStatus::Paused => "Paused",
        }
    }
}

// ─── Campaign ───────────────────────────────────────────────────────────────

/// A search campaign. `name` is non-empty and unique within one export;
/// `budget`, when present, is expected to be positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    #[serde(default)]
    pub status: EntityStatus,
    pub budget: Option<f64>,
    #[serde(default)]
    pub budget_type: BudgetType,
    #[serde(default)]
    pub bidding_strategy: BiddingStrategy,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub tracking_template: Option<String>,
    pub final_url_suffix: Option<String>,
    #[serde(default)]
    pub ad_groups: Vec<AdGroup>,
    #[serde(default)]
    pub negative_keywords: Vec<NegativeKeyword>,
    #[serde(default)]
    pub locations: Vec<LocationTarget>,
    #[serde(default)]
    pub extensions: Vec<Extension>,
}

impl Campaign {
    /// Minimal enabled campaign with defaults for every optional setting.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: EntityStatus::Enabled,
            budget: None,
            budget_type: BudgetType::default(),
            bidding_strategy: BiddingStrategy::default(),
            start_date: None,
            end_date: None,
            language: None,
            tracking_template: None,
            final_url_suffix: None,
            ad_groups: Vec::new(),
            negative_keywords: Vec::new(),
            locations: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetType {
    #[default]
    Daily,
    Total,
}

impl BudgetType {
    pub fn display_name(&self) -> &'static str {
        match self {
            BudgetType::Daily => "Daily",
            BudgetType::Total => "Total",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match squash(raw).as_str() {
            "daily" | "day" => Some(BudgetType::Daily),
            "total" | "campaigntotal" | "lifetime" => Some(BudgetType::Total),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiddingStrategy {
    #[default]
    ManualCpc,
    EnhancedCpc,
    MaximizeClicks,
    MaximizeConversions,
    MaximizeConversionValue,
    TargetCpa,
    TargetRoas,
    TargetImpressionShare,
}

impl BiddingStrategy {
    pub fn display_name(&self) -> &'static str {
        match self {
            BiddingStrategy::ManualCpc => "Manual CPC",
            BiddingStrategy::EnhancedCpc => "Enhanced CPC",
            BiddingStrategy::MaximizeClicks => "Maximize clicks",
            BiddingStrategy::MaximizeConversions => "Maximize conversions",
            BiddingStrategy::MaximizeConversionValue => "Maximize conversion value",
            BiddingStrategy::TargetCpa => "Target CPA",
            BiddingStrategy::TargetRoas => "Target ROAS",
            BiddingStrategy::TargetImpressionShare => "Target impression share",
        }
    }

    /// Accepts display names, snake_case and SCREAMING_CASE spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        match squash(raw).as_str() {
            "manualcpc" | "manual" | "cpc" => Some(BiddingStrategy::ManualCpc),
            "enhancedcpc" | "ecpc" => Some(BiddingStrategy::EnhancedCpc),
            "maximizeclicks" | "maximiseclicks" => Some(BiddingStrategy::MaximizeClicks),
            "maximizeconversions" | "maximiseconversions" => {
                Some(BiddingStrategy::MaximizeConversions)
            }
            "maximizeconversionvalue" | "maximiseconversionvalue" => {
                Some(BiddingStrategy::MaximizeConversionValue)
            }
            "targetcpa" | "tcpa" => Some(BiddingStrategy::TargetCpa),
            "targetroas" | "troas" => Some(BiddingStrategy::TargetRoas),
            "targetimpressionshare" => Some(BiddingStrategy::TargetImpressionShare),
            _ => None,
        }
    }
}

// ─── Ad Group ───────────────────────────────────────────────────────────────

/// An ad group. Belongs to exactly one campaign; `name` is unique within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdGroup {
    pub name: String,
    #[serde(default)]
    pub status: EntityStatus,
    pub default_max_cpc: Option<f64>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub ads: Vec<Ad>,
    #[serde(default)]
    pub negative_keywords: Vec<NegativeKeyword>,
}

impl AdGroup {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: EntityStatus::Enabled,
            default_max_cpc: None,
            keywords: Vec::new(),
            ads: Vec::new(),
            negative_keywords: Vec::new(),
        }
    }
}

// ─── Keywords ───────────────────────────────────────────────────────────────

/// Keyword matching mode. Positive keywords use the first three variants and
/// negative keywords the last three; the two sets never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Broad,
    Phrase,
    Exact,
    NegativeBroad,
    NegativePhrase,
    NegativeExact,
}

impl MatchType {
    pub const KEYWORD: [MatchType; 3] = [MatchType::Broad, MatchType::Phrase, MatchType::Exact];
    pub const NEGATIVE: [MatchType; 3] = [
        MatchType::NegativeBroad,
        MatchType::NegativePhrase,
        MatchType::NegativeExact,
    ];

    /// Column value as Google Ads Editor expects it. Negatives always render
    /// as `Negative <Type>`.
    pub fn display_name(&self) -> &'static str {
        match self {
            MatchType::Broad => "Broad",
            MatchType::Phrase => "Phrase",
            MatchType::Exact => "Exact",
            MatchType::NegativeBroad => "Negative Broad",
            MatchType::NegativePhrase => "Negative Phrase",
            MatchType::NegativeExact => "Negative Exact",
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            MatchType::NegativeBroad | MatchType::NegativePhrase | MatchType::NegativeExact
        )
    }

    pub fn to_negative(self) -> Self {
        match self {
            MatchType::Broad => MatchType::NegativeBroad,
            MatchType::Phrase => MatchType::NegativePhrase,
            MatchType::Exact => MatchType::NegativeExact,
            negative => negative,
        }
    }

    /// Parses `Broad`, `phrase match`, `EXACT`, `Negative Phrase`,
    /// `negative_exact` and the legacy `Broad (Negative)` spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut text = raw.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        let mut negative = false;
        if let Some(stripped) = text.strip_suffix("(negative)") {
            negative = true;
            text = stripped.trim().to_string();
        }
        if let Some(stripped) = text.strip_prefix("negative") {
            negative = true;
            text = stripped.trim().to_string();
        }
        let base = text.strip_suffix("match").unwrap_or(&text).trim();
        let parsed = match base {
            "broad" => MatchType::Broad,
            "phrase" => MatchType::Phrase,
            "exact" => MatchType::Exact,
            _ => return None,
        };
        Some(if negative { parsed.to_negative() } else { parsed })
    }
}

/// A positive keyword. `text` is stored without match-type punctuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub match_type: MatchType,
    pub max_cpc: Option<f64>,
    pub final_url: Option<String>,
}

impl Keyword {
    pub fn new(text: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            text: text.into(),
            match_type,
            max_cpc: None,
            final_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeKeyword {
    pub text: String,
    pub match_type: MatchType,
}

impl NegativeKeyword {
    pub fn new(text: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            text: text.into(),
            match_type,
        }
    }
}

// ─── Ads ────────────────────────────────────────────────────────────────────

/// Ad variants. Each variant owns exactly the fields its CSV block needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ad {
    ResponsiveSearch(ResponsiveSearchAd),
    DynamicKeyword(DynamicKeywordAd),
    CallOnly(CallOnlyAd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdKind {
    ResponsiveSearch,
    DynamicKeyword,
    CallOnly,
}

impl AdKind {
    /// Value of the `Ad Type` column.
    pub fn display_name(&self) -> &'static str {
        match self {
            AdKind::ResponsiveSearch => "Responsive search ad",
            AdKind::DynamicKeyword => "Expanded text ad",
            AdKind::CallOnly => "Call-only ad",
        }
    }
}

impl Ad {
    pub fn kind(&self) -> AdKind {
        match self {
            Ad::ResponsiveSearch(_) => AdKind::ResponsiveSearch,
            Ad::DynamicKeyword(_) => AdKind::DynamicKeyword,
            Ad::CallOnly(_) => AdKind::CallOnly,
        }
    }

    pub fn headlines(&self) -> &[String] {
        match self {
            Ad::ResponsiveSearch(ad) => &ad.headlines,
            Ad::DynamicKeyword(ad) => &ad.headlines,
            Ad::CallOnly(ad) => &ad.headlines,
        }
    }

    pub fn descriptions(&self) -> &[String] {
        match self {
            Ad::ResponsiveSearch(ad) => &ad.descriptions,
            Ad::DynamicKeyword(ad) => &ad.descriptions,
            Ad::CallOnly(ad) => &ad.descriptions,
        }
    }

    pub fn final_url(&self) -> Option<&str> {
        match self {
            Ad::ResponsiveSearch(ad) => Some(&ad.final_url),
            Ad::DynamicKeyword(ad) => Some(&ad.final_url),
            Ad::CallOnly(ad) => ad.verification_url.as_deref(),
        }
    }

    pub fn final_mobile_url(&self) -> Option<&str> {
        match self {
            Ad::ResponsiveSearch(ad) => ad.final_mobile_url.as_deref(),
            Ad::DynamicKeyword(ad) => ad.final_mobile_url.as_deref(),
            Ad::CallOnly(_) => None,
        }
    }

    /// Display paths, `(path1, path2)`. Call-only ads have none.
    pub fn paths(&self) -> (Option<&str>, Option<&str>) {
        match self {
            Ad::ResponsiveSearch(ad) => (ad.path1.as_deref(), ad.path2.as_deref()),
            Ad::DynamicKeyword(ad) => (ad.path1.as_deref(), ad.path2.as_deref()),
            Ad::CallOnly(_) => (None, None),
        }
    }

    pub fn status(&self) -> EntityStatus {
        match self {
            Ad::ResponsiveSearch(ad) => ad.status,
            Ad::DynamicKeyword(ad) => ad.status,
            Ad::CallOnly(ad) => ad.status,
        }
    }
}

/// Responsive search ad: 1–15 headlines, 1–4 descriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsiveSearchAd {
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
    pub path1: Option<String>,
    pub path2: Option<String>,
    pub final_url: String,
    pub final_mobile_url: Option<String>,
    #[serde(default)]
    pub status: EntityStatus,
}

/// Text ad carrying `{KeyWord:Default Text}` insertion macros. Exported
/// through the expanded-text block: three headlines, two descriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicKeywordAd {
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
    pub path1: Option<String>,
    pub path2: Option<String>,
    pub final_url: String,
    pub final_mobile_url: Option<String>,
    #[serde(default)]
    pub status: EntityStatus,
}

impl DynamicKeywordAd {
    pub const MAX_HEADLINES: usize = 3;
    pub const MAX_DESCRIPTIONS: usize = 2;
}

/// Call-only ad. `verification_url` is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOnlyAd {
    pub business_name: String,
    pub phone_number: String,
    pub country_code: String,
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
    pub verification_url: Option<String>,
    #[serde(default)]
    pub status: EntityStatus,
}

impl CallOnlyAd {
    pub const MAX_HEADLINES: usize = 2;
    pub const MAX_DESCRIPTIONS: usize = 2;
}

// ─── Location Targeting ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationTargetType {
    PostalCode,
    City,
    State,
    Country,
}

impl LocationTargetType {
    pub fn display_name(&self) -> &'static str {
        match self {
            LocationTargetType::PostalCode => "Postal Code",
            LocationTargetType::City => "City",
            LocationTargetType::State => "State",
            LocationTargetType::Country => "Country",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match squash(raw).as_str() {
            "postalcode" | "postal" | "zip" | "zipcode" | "zipcodes" => {
                Some(LocationTargetType::PostalCode)
            }
            "city" | "cities" => Some(LocationTargetType::City),
            "state" | "states" | "region" => Some(LocationTargetType::State),
            "country" => Some(LocationTargetType::Country),
            _ => None,
        }
    }
}

/// A geographic target. `bid_adjustment` is a percentage (`20.0` = +20%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationTarget {
    pub target_type: LocationTargetType,
    pub value: String,
    pub bid_adjustment: Option<f64>,
}

impl LocationTarget {
    pub fn new(target_type: LocationTargetType, value: impl Into<String>) -> Self {
        Self {
            target_type,
            value: value.into(),
            bid_adjustment: None,
        }
    }
}

// ─── Extensions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extension {
    Sitelink(Sitelink),
    Callout(Callout),
    StructuredSnippet(StructuredSnippet),
    Call(CallExtension),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sitelink {
    pub text: String,
    pub description1: Option<String>,
    pub description2: Option<String>,
    pub final_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Callout {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredSnippet {
    pub header: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallExtension {
    pub phone_number: String,
    pub country_code: String,
}

/// Lowercase and drop everything that is not ASCII alphanumeric, so that
/// `Manual CPC`, `manual_cpc` and `MANUAL-CPC` compare equal.
fn squash(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_parse_variants() {
        assert_eq!(MatchType::parse("Broad"), Some(MatchType::Broad));
        assert_eq!(MatchType::parse("phrase match"), Some(MatchType::Phrase));
        assert_eq!(MatchType::parse("EXACT"), Some(MatchType::Exact));
        assert_eq!(
            MatchType::parse("Negative Phrase"),
            Some(MatchType::NegativePhrase)
        );
        assert_eq!(
            MatchType::parse("NEGATIVE_EXACT"),
            Some(MatchType::NegativeExact)
        );
        assert_eq!(
            MatchType::parse("Broad (Negative)"),
            Some(MatchType::NegativeBroad)
        );
        assert_eq!(MatchType::parse("fuzzy"), None);
        assert_eq!(MatchType::parse(""), None);
    }

    #[test]
    fn test_negative_match_types_render_prefixed() {
        for mt in MatchType::NEGATIVE {
            assert!(mt.display_name().starts_with("Negative "));
            assert!(!mt.display_name().contains("(Negative)"));
        }
        for mt in MatchType::KEYWORD {
            assert!(!mt.is_negative());
            assert!(mt.to_negative().is_negative());
        }
    }

    #[test]
    fn test_bidding_strategy_parse() {
        assert_eq!(
            BiddingStrategy::parse("Manual CPC"),
            Some(BiddingStrategy::ManualCpc)
        );
        assert_eq!(
            BiddingStrategy::parse("MAXIMIZE_CONVERSIONS"),
            Some(BiddingStrategy::MaximizeConversions)
        );
        assert_eq!(
            BiddingStrategy::parse("target_roas"),
            Some(BiddingStrategy::TargetRoas)
        );
        assert_eq!(BiddingStrategy::parse("whatever"), None);
    }

    #[test]
    fn test_ad_accessors() {
        let ad = Ad::CallOnly(CallOnlyAd {
            business_name: "Acme Locks".to_string(),
            phone_number: "+1 555 010 0000".to_string(),
            country_code: "US".to_string(),
            headlines: vec!["Call Now".to_string()],
            descriptions: vec![],
            verification_url: None,
            status: EntityStatus::Enabled,
        });
        assert_eq!(ad.kind(), AdKind::CallOnly);
        assert_eq!(ad.final_url(), None);
        assert_eq!(ad.paths(), (None, None));
        assert_eq!(ad.headlines().len(), 1);
    }

    #[test]
    fn test_structure_counts_span_campaigns() {
        let mut first = AdGroup::named("A");
        first.keywords = vec![
            Keyword::new("locksmith", MatchType::Broad),
            Keyword::new("locksmith", MatchType::Exact),
        ];
        let mut second = AdGroup::named("B");
        second.keywords = vec![Keyword::new("rekey", MatchType::Phrase)];
        let mut one = Campaign::named("One");
        one.ad_groups = vec![first];
        let mut two = Campaign::named("Two");
        two.ad_groups = vec![second, AdGroup::named("C")];
        let structure = CampaignStructure {
            campaigns: vec![one, two],
        };
        assert_eq!(structure.ad_group_count(), 3);
        assert_eq!(structure.keyword_count(), 3);
    }

    #[test]
    fn test_location_type_parse() {
        assert_eq!(
            LocationTargetType::parse("ZIP"),
            Some(LocationTargetType::PostalCode)
        );
        assert_eq!(
            LocationTargetType::parse("Postal Code"),
            Some(LocationTargetType::PostalCode)
        );
        assert_eq!(
            LocationTargetType::parse("COUNTRY"),
            Some(LocationTargetType::Country)
        );
        assert_eq!(LocationTargetType::parse("planet"), None);
    }
}
