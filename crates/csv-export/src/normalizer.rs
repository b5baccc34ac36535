//! Campaign structure normalizer.
//!
//! Campaign builders in the dashboard hand over loosely-typed JSON: keys may be
//! camelCase or snake_case, arrays may be missing or null, keywords may carry
//! match-type punctuation, and ad copy may be flat (`headline1`..) or nested
//! (`headlines: [..]`). [`Normalizer::normalize`] turns any of those shapes into
//! one [`CampaignStructure`], or fails with a [`NormalizationError`] listing every
//! structural problem it found.
//!
//! Defaults: match types fall back to `Broad`, negative keywords to an empty
//! list, bidding strategy to `Manual CPC`, budget type to `Daily`, and status to
//! `Enabled`.

use adiology_core::types::{
    Ad, AdGroup, AdKind, BiddingStrategy, BudgetType, CallExtension, CallOnlyAd, Callout, Campaign,
    CampaignStructure, DynamicKeywordAd, EntityStatus, Extension, Keyword, LocationTarget,
    LocationTargetType, MatchType, NegativeKeyword, ResponsiveSearchAd, Sitelink,
    StructuredSnippet,
};
use adiology_core::{ExportConfig, NormalizationError, NormalizationProblem, ProblemKind};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::debug;

use crate::dki;

// ─── Field aliases ──────────────────────────────────────────────────────────
//
// Keys are compared after lowercasing and dropping non-alphanumerics, so
// `ad_groups`, `adGroups` and `adgroups` are the same key.

const CAMPAIGNS: &[&str] = &["campaigns"];

const CAMPAIGN_NAME: &[&str] = &["campaign_name", "name", "campaign"];
const STATUS: &[&str] = &["status"];
const BUDGET: &[&str] = &["budget", "daily_budget"];
const BUDGET_TYPE: &[&str] = &["budget_type"];
const BIDDING_STRATEGY: &[&str] = &["bidding_strategy", "bid_strategy", "bid_strategy_type"];
const START_DATE: &[&str] = &["start_date"];
const END_DATE: &[&str] = &["end_date"];
const LANGUAGE: &[&str] = &["language", "campaign_language"];
const TRACKING_TEMPLATE: &[&str] = &["tracking_template"];
const FINAL_URL_SUFFIX: &[&str] = &["final_url_suffix"];
const AD_GROUPS: &[&str] = &["ad_groups"];
const NEGATIVE_KEYWORDS: &[&str] = &["negative_keywords", "negatives"];
const LOCATIONS: &[&str] = &["locations", "location_targets"];
const ZIP_CODES: &[&str] = &["zip_codes", "zips", "postal_codes"];
const CITIES: &[&str] = &["cities"];
const STATES: &[&str] = &["states"];
const TARGET_COUNTRY: &[&str] = &["target_country", "country"];
const LOCATION_TYPE: &[&str] = &["location_type"];
const LOCATION_CODE: &[&str] = &["location_code"];
const EXTENSIONS: &[&str] = &["extensions"];
const SITELINKS: &[&str] = &["sitelinks"];
const CALLOUTS: &[&str] = &["callouts"];
const SNIPPETS: &[&str] = &["structured_snippets", "snippets"];
const CALL_EXTENSIONS: &[&str] = &["call_extensions"];

const AD_GROUP_NAME: &[&str] = &["adgroup_name", "name", "ad_group"];
const DEFAULT_MAX_CPC: &[&str] = &["default_max_cpc", "max_cpc", "cpc_bid"];
const KEYWORDS: &[&str] = &["keywords"];
const MATCH_TYPES: &[&str] = &["match_types"];
const ADS: &[&str] = &["ads"];

const KEYWORD_TEXT: &[&str] = &["text", "keyword"];
const MATCH_TYPE: &[&str] = &["match_type", "criterion_type"];
const MAX_CPC: &[&str] = &["max_cpc", "cpc"];
const FINAL_URL: &[&str] = &["final_url", "url"];

const AD_TYPE: &[&str] = &["type", "ad_type"];
const HEADLINES: &[&str] = &["headlines"];
const DESCRIPTIONS: &[&str] = &["descriptions"];
const FINAL_MOBILE_URL: &[&str] = &["final_mobile_url"];
const PATH1: &[&str] = &["path1"];
const PATH2: &[&str] = &["path2"];
const BUSINESS_NAME: &[&str] = &["business_name"];
const PHONE: &[&str] = &["phone_number", "phone"];
const COUNTRY_CODE: &[&str] = &["country_code"];
const VERIFICATION_URL: &[&str] = &["verification_url"];

const TARGET_TYPE: &[&str] = &["target_type", "type"];
const TARGET_VALUE: &[&str] = &["value", "name", "code"];
const BID_ADJUSTMENT: &[&str] = &["bid_adjustment"];

const EXTENSION_KIND: &[&str] = &["extension_type", "type", "kind"];
const SITELINK_LINKS: &[&str] = &["links"];
const SITELINK_TEXT: &[&str] = &["text", "link_text", "sitelink_text"];
const SITELINK_DESCRIPTION1: &[&str] = &["description1", "description", "description_line_1"];
const SITELINK_DESCRIPTION2: &[&str] = &["description2", "description_line_2"];
const SITELINK_URL: &[&str] = &["final_url", "url"];
const CALLOUT_TEXT: &[&str] = &["text", "value", "callout_text"];
const SNIPPET_HEADER: &[&str] = &["header"];
const SNIPPET_VALUES: &[&str] = &["values"];

/// Keys each entity understands. A trailing `*` accepts any numeric suffix.
const KNOWN_TOP_LEVEL: &[&str] = &["campaigns"];
const KNOWN_CAMPAIGN: &[&str] = &[
    "campaign_name", "name", "campaign", "id", "campaign_id", "status", "budget",
    "daily_budget", "budget_type", "bidding_strategy", "bid_strategy", "bid_strategy_type",
    "start_date", "end_date", "language", "campaign_language", "tracking_template",
    "final_url_suffix", "ad_groups", "negative_keywords", "negatives", "locations",
    "location_targets", "zip_codes", "zips", "postal_codes", "cities", "states",
    "target_country", "country", "location_type", "location_code", "extensions", "sitelinks",
    "callouts", "structured_snippets", "snippets", "call_extensions",
];
const KNOWN_AD_GROUP: &[&str] = &[
    "adgroup_name", "name", "ad_group", "id", "status", "default_max_cpc", "max_cpc",
    "cpc_bid", "keywords", "match_types", "negative_keywords", "negatives", "ads",
    "location_target", "zip_codes", "cities", "states",
];
const KNOWN_KEYWORD: &[&str] = &["text", "keyword", "match_type", "criterion_type", "max_cpc", "cpc", "final_url", "url"];
const KNOWN_AD: &[&str] = &[
    "id", "type", "ad_type", "status", "headlines", "descriptions", "headline*", "description*",
    "final_url", "url", "final_mobile_url", "path1", "path2", "business_name", "phone_number",
    "phone", "country_code", "verification_url", "extensions", "tracking_template",
    "custom_parameters",
];

/// Builds [`CampaignStructure`]s from loosely-typed JSON.
#[derive(Debug, Clone)]
pub struct Normalizer<'c> {
    config: &'c ExportConfig,
}

impl<'c> Normalizer<'c> {
    pub fn new(config: &'c ExportConfig) -> Self {
        Self { config }
    }

    /// Normalize `input`. Pure: the input is only read.
    pub fn normalize(&self, input: &Value) -> Result<CampaignStructure, NormalizationError> {
        let mut cx = Context::new(self.config.reject_unknown_fields);

        let items: Vec<&Value> = match input {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => {
                let top = Fields::new(map, String::new());
                match top.get(CAMPAIGNS) {
                    Some(Value::Array(items)) => {
                        cx.check_unknown(&top, KNOWN_TOP_LEVEL);
                        items.iter().collect()
                    }
                    Some(_) => {
                        cx.invalid("campaigns", "expected a list of campaigns");
                        Vec::new()
                    }
                    // A bare campaign object is accepted as a one-campaign export.
                    None if top.get(AD_GROUPS).is_some() => vec![input],
                    None => {
                        cx.missing("campaigns", "campaigns are required");
                        Vec::new()
                    }
                }
            }
            _ => {
                cx.invalid("campaigns", "expected an object with a campaigns list");
                Vec::new()
            }
        };

        if items.is_empty() && cx.problems.is_empty() {
            cx.missing("campaigns", "at least one campaign is required");
        }

        let campaigns: Vec<Campaign> = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| self.campaign(&mut cx, value, format!("campaigns[{i}]")))
            .collect();

        if cx.problems.is_empty() {
            let structure = CampaignStructure { campaigns };
            debug!(
                campaigns = structure.campaigns.len(),
                ad_groups = structure.ad_group_count(),
                keywords = structure.keyword_count(),
                "campaign structure normalized"
            );
            Ok(structure)
        } else {
            Err(NormalizationError::new(cx.problems))
        }
    }

    fn campaign(&self, cx: &mut Context, value: &Value, path: String) -> Option<Campaign> {
        let fields = cx.object(value, path)?;
        cx.check_unknown(&fields, KNOWN_CAMPAIGN);

        let mut campaign = Campaign::named(String::new());
        match fields.get(CAMPAIGN_NAME).and_then(text) {
            Some(name) => campaign.name = name,
            None => cx.missing(fields.path("campaign_name"), "campaign name is required"),
        }

        if let Some(v) = fields.get(STATUS) {
            campaign.status = status(cx, v, fields.path("status"));
        }
        campaign.budget = fields
            .get(BUDGET)
            .and_then(|v| number(cx, v, fields.path("budget")));
        if let Some(raw) = fields.get(BUDGET_TYPE).and_then(text) {
            match BudgetType::parse(&raw) {
                Some(bt) => campaign.budget_type = bt,
                None => cx.unrecognized(
                    fields.path("budget_type"),
                    format!("unknown budget type '{raw}'"),
                ),
            }
        }
        if let Some(raw) = fields.get(BIDDING_STRATEGY).and_then(text) {
            match BiddingStrategy::parse(&raw) {
                Some(bs) => campaign.bidding_strategy = bs,
                None => cx.unrecognized(
                    fields.path("bidding_strategy"),
                    format!("unknown bidding strategy '{raw}'"),
                ),
            }
        }
        campaign.start_date = fields
            .get(START_DATE)
            .and_then(|v| date(cx, v, fields.path("start_date")));
        campaign.end_date = fields
            .get(END_DATE)
            .and_then(|v| date(cx, v, fields.path("end_date")));
        campaign.language = fields.get(LANGUAGE).and_then(text);
        campaign.tracking_template = fields.get(TRACKING_TEMPLATE).and_then(text);
        campaign.final_url_suffix = fields.get(FINAL_URL_SUFFIX).and_then(text);

        campaign.negative_keywords = self.negative_keywords(
            cx,
            fields.get(NEGATIVE_KEYWORDS),
            fields.path("negative_keywords"),
        );
        campaign.locations = self.locations(cx, &fields);

        let mut extensions = self.campaign_extensions(cx, &fields);

        let groups_path = fields.path("ad_groups");
        campaign.ad_groups = match fields.get(AD_GROUPS) {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| {
                    self.ad_group(cx, v, format!("{groups_path}[{i}]"), &mut extensions)
                })
                .collect(),
            Some(_) => {
                cx.invalid(groups_path, "expected a list of ad groups");
                Vec::new()
            }
            None => {
                cx.missing(groups_path, "ad groups are required");
                Vec::new()
            }
        };
        campaign.extensions = extensions;

        Some(campaign)
    }

    fn ad_group(
        &self,
        cx: &mut Context,
        value: &Value,
        path: String,
        extensions: &mut Vec<Extension>,
    ) -> Option<AdGroup> {
        let fields = cx.object(value, path)?;
        cx.check_unknown(&fields, KNOWN_AD_GROUP);

        let mut group = AdGroup::named(String::new());
        match fields.get(AD_GROUP_NAME).and_then(text) {
            Some(name) => group.name = name,
            None => cx.missing(fields.path("adgroup_name"), "ad group name is required"),
        }
        if let Some(v) = fields.get(STATUS) {
            group.status = status(cx, v, fields.path("status"));
        }
        group.default_max_cpc = fields
            .get(DEFAULT_MAX_CPC)
            .and_then(|v| number(cx, v, fields.path("default_max_cpc")));

        let match_types = match_types(cx, fields.get(MATCH_TYPES), fields.path("match_types"));
        group.keywords = self.keywords(
            cx,
            fields.get(KEYWORDS),
            &match_types,
            fields.path("keywords"),
        );
        group.negative_keywords = self.negative_keywords(
            cx,
            fields.get(NEGATIVE_KEYWORDS),
            fields.path("negative_keywords"),
        );

        let ads_path = fields.path("ads");
        group.ads = match fields.get(ADS) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| self.ad(cx, v, format!("{ads_path}[{i}]"), extensions))
                .collect(),
            Some(_) => {
                cx.invalid(ads_path, "expected a list of ads");
                Vec::new()
            }
        };

        Some(group)
    }

    // ─── Keywords ───────────────────────────────────────────────────────

    fn keywords(
        &self,
        cx: &mut Context,
        value: Option<&Value>,
        match_types: &[MatchType],
        path: String,
    ) -> Vec<Keyword> {
        let items = match value {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                cx.invalid(path, "expected a list of keywords");
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{i}]");
            match item {
                Value::String(raw) if raw.trim().is_empty() => {}
                Value::String(raw) => {
                    let (keyword_text, punctuated) = strip_match_punctuation(raw);
                    match punctuated {
                        Some(mt) => out.push(Keyword::new(keyword_text, mt)),
                        None => out.extend(
                            match_types
                                .iter()
                                .map(|mt| Keyword::new(keyword_text.clone(), *mt)),
                        ),
                    }
                }
                Value::Object(map) => {
                    let fields = Fields::new(map, item_path);
                    cx.check_unknown(&fields, KNOWN_KEYWORD);
                    let Some(raw) = fields.get(KEYWORD_TEXT).and_then(text) else {
                        cx.missing(fields.path("text"), "keyword text is required");
                        continue;
                    };
                    let (keyword_text, punctuated) = strip_match_punctuation(&raw);
                    let explicit = fields.get(MATCH_TYPE).and_then(text).and_then(|mt| {
                        let parsed = MatchType::parse(&mt);
                        if parsed.is_none() {
                            cx.unrecognized(
                                fields.path("match_type"),
                                format!("unknown match type '{mt}'"),
                            );
                        }
                        parsed
                    });
                    let max_cpc = fields
                        .get(MAX_CPC)
                        .and_then(|v| number(cx, v, fields.path("max_cpc")));
                    let final_url = fields.get(FINAL_URL).and_then(text);
                    let resolved: Vec<MatchType> = match explicit.or(punctuated) {
                        Some(mt) => vec![mt],
                        None => match_types.to_vec(),
                    };
                    for mt in resolved {
                        out.push(Keyword {
                            text: keyword_text.clone(),
                            match_type: mt,
                            max_cpc,
                            final_url: final_url.clone(),
                        });
                    }
                }
                _ => cx.invalid(item_path, "expected keyword text or a keyword object"),
            }
        }
        out
    }

    fn negative_keywords(
        &self,
        cx: &mut Context,
        value: Option<&Value>,
        path: String,
    ) -> Vec<NegativeKeyword> {
        let items: Vec<Value> = match value {
            None => return Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(Value::String(s)) => split_list(s).into_iter().map(Value::String).collect(),
            Some(_) => {
                cx.invalid(path, "expected a list of negative keywords");
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{i}]");
            match item {
                Value::String(raw) if raw.trim().is_empty() => {}
                Value::String(raw) => out.push(negative_from_text(raw, None)),
                Value::Object(map) => {
                    let fields = Fields::new(map, item_path);
                    cx.check_unknown(&fields, KNOWN_KEYWORD);
                    let Some(raw) = fields.get(KEYWORD_TEXT).and_then(text) else {
                        cx.missing(fields.path("text"), "negative keyword text is required");
                        continue;
                    };
                    let explicit = fields.get(MATCH_TYPE).and_then(text).and_then(|mt| {
                        let parsed = MatchType::parse(&mt);
                        if parsed.is_none() {
                            cx.unrecognized(
                                fields.path("match_type"),
                                format!("unknown match type '{mt}'"),
                            );
                        }
                        parsed
                    });
                    out.push(negative_from_text(&raw, explicit));
                }
                _ => cx.invalid(item_path, "expected negative keyword text or object"),
            }
        }
        out
    }

    // ─── Ads ────────────────────────────────────────────────────────────

    fn ad(
        &self,
        cx: &mut Context,
        value: &Value,
        path: String,
        extensions: &mut Vec<Extension>,
    ) -> Option<Ad> {
        let fields = cx.object(value, path)?;
        cx.check_unknown(&fields, KNOWN_AD);

        let headlines = copy_lines(cx, &fields, HEADLINES, "headline", 15);
        let descriptions = copy_lines(cx, &fields, DESCRIPTIONS, "description", 4);

        let kind = match fields.get(AD_TYPE).and_then(text) {
            Some(raw) => match parse_ad_kind(&raw) {
                Some(kind) => kind,
                None => {
                    cx.unrecognized(fields.path("type"), format!("unknown ad type '{raw}'"));
                    return None;
                }
            },
            None if headlines
                .iter()
                .chain(descriptions.iter())
                .any(|line| dki::contains_keyword_macro(line)) =>
            {
                AdKind::DynamicKeyword
            }
            None => AdKind::ResponsiveSearch,
        };

        let status = fields
            .get(STATUS)
            .map(|v| status(cx, v, fields.path("status")))
            .unwrap_or_default();
        let final_url = fields.get(FINAL_URL).and_then(text);
        let final_mobile_url = fields.get(FINAL_MOBILE_URL).and_then(text);
        let path1 = fields.get(PATH1).and_then(text);
        let path2 = fields.get(PATH2).and_then(text);

        if let Some(v) = fields.get(EXTENSIONS) {
            extensions.extend(self.extension_list(cx, v, fields.path("extensions")));
        }

        let ad = match kind {
            AdKind::ResponsiveSearch => Ad::ResponsiveSearch(ResponsiveSearchAd {
                headlines,
                descriptions,
                path1,
                path2,
                final_url: final_url.unwrap_or_default(),
                final_mobile_url,
                status,
            }),
            AdKind::DynamicKeyword => Ad::DynamicKeyword(DynamicKeywordAd {
                headlines,
                descriptions,
                path1,
                path2,
                final_url: final_url.unwrap_or_default(),
                final_mobile_url,
                status,
            }),
            AdKind::CallOnly => Ad::CallOnly(CallOnlyAd {
                business_name: fields.get(BUSINESS_NAME).and_then(text).unwrap_or_default(),
                phone_number: fields.get(PHONE).and_then(text).unwrap_or_default(),
                country_code: fields
                    .get(COUNTRY_CODE)
                    .and_then(text)
                    .unwrap_or_else(|| "US".to_string()),
                headlines,
                descriptions,
                verification_url: fields.get(VERIFICATION_URL).and_then(text).or(final_url),
                status,
            }),
        };
        Some(ad)
    }

    // ─── Locations ──────────────────────────────────────────────────────

    fn locations(&self, cx: &mut Context, fields: &Fields<'_>) -> Vec<LocationTarget> {
        let mut out = Vec::new();

        if let Some(value) = fields.get(LOCATIONS) {
            let path = fields.path("locations");
            match value {
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if let Some(target) = location(cx, item, format!("{path}[{i}]")) {
                            out.push(target);
                        }
                    }
                }
                _ => cx.invalid(path, "expected a list of location targets"),
            }
        }

        for (keys, field, target_type) in [
            (ZIP_CODES, "zip_codes", LocationTargetType::PostalCode),
            (CITIES, "cities", LocationTargetType::City),
            (STATES, "states", LocationTargetType::State),
        ] {
            if let Some(value) = fields.get(keys) {
                for entry in string_list(cx, value, fields.path(field)) {
                    out.push(LocationTarget::new(target_type, entry));
                }
            }
        }

        // Country targeting only applies when nothing narrower was chosen.
        if out.is_empty() {
            let country = fields.get(TARGET_COUNTRY).and_then(text).or_else(|| {
                let is_country = fields
                    .get(LOCATION_TYPE)
                    .and_then(text)
                    .map(|t| t.eq_ignore_ascii_case("country"))
                    .unwrap_or(false);
                if is_country {
                    fields.get(LOCATION_CODE).and_then(text)
                } else {
                    None
                }
            });
            if let Some(country) = country {
                out.push(LocationTarget::new(LocationTargetType::Country, country));
            }
        }

        out
    }

    // ─── Extensions ─────────────────────────────────────────────────────

    fn campaign_extensions(&self, cx: &mut Context, fields: &Fields<'_>) -> Vec<Extension> {
        let mut out = Vec::new();

        if let Some(v) = fields.get(EXTENSIONS) {
            out.extend(self.extension_list(cx, v, fields.path("extensions")));
        }
        if let Some(v) = fields.get(SITELINKS) {
            for (i, item) in as_list(cx, v, fields.path("sitelinks")).iter().enumerate() {
                if let Some(link) = sitelink(cx, item, format!("{}[{i}]", fields.path("sitelinks"))) {
                    out.push(Extension::Sitelink(link));
                }
            }
        }
        if let Some(v) = fields.get(CALLOUTS) {
            for (i, item) in as_list(cx, v, fields.path("callouts")).iter().enumerate() {
                if let Some(callout) = callout(cx, item, format!("{}[{i}]", fields.path("callouts"))) {
                    out.push(Extension::Callout(callout));
                }
            }
        }
        if let Some(v) = fields.get(SNIPPETS) {
            for (i, item) in as_list(cx, v, fields.path("structured_snippets")).iter().enumerate() {
                let path = format!("{}[{i}]", fields.path("structured_snippets"));
                if let Some(snippet) = structured_snippet(cx, item, path) {
                    out.push(Extension::StructuredSnippet(snippet));
                }
            }
        }
        if let Some(v) = fields.get(CALL_EXTENSIONS) {
            for (i, item) in as_list(cx, v, fields.path("call_extensions")).iter().enumerate() {
                let path = format!("{}[{i}]", fields.path("call_extensions"));
                if let Some(call) = call_extension(cx, item, path) {
                    out.push(Extension::Call(call));
                }
            }
        }

        out
    }

    /// Tagged extension objects, as attached to ads by the builders.
    fn extension_list(&self, cx: &mut Context, value: &Value, path: String) -> Vec<Extension> {
        let mut out = Vec::new();
        for (i, item) in as_list(cx, value, path.clone()).iter().enumerate() {
            let item_path = format!("{path}[{i}]");
            let Some(fields) = cx.object(item, item_path) else {
                continue;
            };
            let Some(kind) = fields.get(EXTENSION_KIND).and_then(text) else {
                cx.missing(fields.path("extension_type"), "extension type is required");
                continue;
            };
            match squash(&kind).as_str() {
                "sitelink" | "sitelinks" => match fields.get(SITELINK_LINKS) {
                    Some(links) => {
                        let links_path = fields.path("links");
                        for (j, link) in as_list(cx, links, links_path.clone()).iter().enumerate() {
                            if let Some(s) = sitelink(cx, link, format!("{links_path}[{j}]")) {
                                out.push(Extension::Sitelink(s));
                            }
                        }
                    }
                    None => out.extend(sitelink(cx, item, fields.path.clone()).map(Extension::Sitelink)),
                },
                "callout" | "callouts" => match fields.get(&["values", "callouts"]) {
                    Some(values) => {
                        let values_path = fields.path("values");
                        for (j, v) in as_list(cx, values, values_path.clone()).iter().enumerate() {
                            if let Some(c) = callout(cx, v, format!("{values_path}[{j}]")) {
                                out.push(Extension::Callout(c));
                            }
                        }
                    }
                    None => out.extend(callout(cx, item, fields.path.clone()).map(Extension::Callout)),
                },
                "structuredsnippet" | "structuredsnippets" | "snippet" => out.extend(
                    structured_snippet(cx, item, fields.path.clone())
                        .map(Extension::StructuredSnippet),
                ),
                "call" | "callextension" => {
                    out.extend(call_extension(cx, item, fields.path.clone()).map(Extension::Call))
                }
                _ => cx.unrecognized(
                    fields.path("extension_type"),
                    format!("unknown extension type '{kind}'"),
                ),
            }
        }
        out
    }
}

// ─── Context ────────────────────────────────────────────────────────────────

struct Context {
    problems: Vec<NormalizationProblem>,
    reject_unknown: bool,
}

impl Context {
    fn new(reject_unknown: bool) -> Self {
        Self {
            problems: Vec::new(),
            reject_unknown,
        }
    }

    fn push(&mut self, path: impl Into<String>, kind: ProblemKind, message: impl Into<String>) {
        self.problems.push(NormalizationProblem {
            path: path.into(),
            kind,
            message: message.into(),
        });
    }

    fn missing(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(path, ProblemKind::Missing, message);
    }

    fn invalid(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(path, ProblemKind::InvalidValue, message);
    }

    fn unrecognized(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(path, ProblemKind::Unrecognized, message);
    }

    fn object<'v>(&mut self, value: &'v Value, path: String) -> Option<Fields<'v>> {
        match value {
            Value::Object(map) => Some(Fields::new(map, path)),
            _ => {
                self.invalid(path, "expected an object");
                None
            }
        }
    }

    fn check_unknown(&mut self, fields: &Fields<'_>, known: &[&str]) {
        for key in fields.map.keys() {
            let canon = squash(key);
            let recognized = known.iter().any(|k| match k.strip_suffix('*') {
                Some(prefix) => canon
                    .strip_prefix(&squash(prefix))
                    .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false),
                None => squash(k) == canon,
            });
            if recognized {
                continue;
            }
            if self.reject_unknown {
                self.unrecognized(fields.path(key), format!("unknown field '{key}'"));
            } else {
                debug!(field = %fields.path(key), "ignoring unknown field");
            }
        }
    }
}

/// Case- and separator-insensitive view over one JSON object.
struct Fields<'v> {
    map: &'v Map<String, Value>,
    path: String,
}

impl<'v> Fields<'v> {
    fn new(map: &'v Map<String, Value>, path: String) -> Self {
        Self { map, path }
    }

    /// First non-null value under any of `aliases`.
    fn get(&self, aliases: &[&str]) -> Option<&'v Value> {
        aliases.iter().find_map(|alias| {
            let wanted = squash(alias);
            self.map
                .iter()
                .find(|(key, value)| !value.is_null() && squash(key) == wanted)
                .map(|(_, value)| value)
        })
    }

    fn path(&self, field: &str) -> String {
        if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{field}", self.path)
        }
    }
}

// ─── Value helpers ──────────────────────────────────────────────────────────

fn squash(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Trimmed, non-blank text. Numbers are accepted and rendered as text.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(cx: &mut Context, value: &Value, path: String) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            match cleaned.parse::<f64>() {
                Ok(n) if n.is_finite() => Some(n),
                _ => {
                    cx.invalid(path, format!("expected a number, found '{}'", s.trim()));
                    None
                }
            }
        }
        _ => {
            cx.invalid(path, "expected a number");
            None
        }
    }
}

fn date(cx: &mut Context, value: &Value, path: String) -> Option<NaiveDate> {
    let raw = text(value)?;
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            cx.invalid(path, format!("expected a YYYY-MM-DD date, found '{raw}'"));
            None
        }
    }
}

fn status(cx: &mut Context, value: &Value, path: String) -> EntityStatus {
    match text(value).map(|s| squash(&s)).as_deref() {
        Some("enabled") | Some("active") | Some("enable") => EntityStatus::Enabled,
        Some("paused") | Some("pause") => EntityStatus::Paused,
        Some(other) => {
            cx.unrecognized(path, format!("unknown status '{other}'"));
            EntityStatus::Enabled
        }
        None => EntityStatus::Enabled,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strings from an array (numbers allowed) or from a delimited string.
fn string_list(cx: &mut Context, value: &Value, path: String) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(s) => split_list(s),
        _ => {
            cx.invalid(path, "expected a list");
            Vec::new()
        }
    }
}

fn as_list(cx: &mut Context, value: &Value, path: String) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(_) => vec![value.clone()],
        _ => {
            cx.invalid(path, "expected a list");
            Vec::new()
        }
    }
}

fn match_types(cx: &mut Context, value: Option<&Value>, path: String) -> Vec<MatchType> {
    let mut out: Vec<MatchType> = Vec::new();
    let mut add = |cx: &mut Context, raw: &str, at: String| match MatchType::parse(raw) {
        Some(mt) => {
            if !out.contains(&mt) {
                out.push(mt);
            }
        }
        None => cx.unrecognized(at, format!("unknown match type '{raw}'")),
    };

    match value {
        None => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if let Some(raw) = text(item) {
                    add(cx, &raw, format!("{path}[{i}]"));
                }
            }
        }
        Some(Value::String(s)) => {
            for raw in split_list(s) {
                add(cx, &raw, path.clone());
            }
        }
        // `{ broad: true, phrase: false, exact: true }`
        Some(Value::Object(map)) => {
            for (key, enabled) in map {
                if enabled.as_bool() == Some(true) {
                    add(cx, key, format!("{path}.{key}"));
                }
            }
        }
        Some(_) => cx.invalid(path, "expected a list of match types"),
    }

    if out.is_empty() {
        out.push(MatchType::Broad);
    }
    out
}

/// Strips `"phrase"` / `[exact]` punctuation and reports the implied match type.
pub fn strip_match_punctuation(raw: &str) -> (String, Option<MatchType>) {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 {
        if let Some(inner) = trimmed.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            return (inner.trim().to_string(), Some(MatchType::Exact));
        }
        if let Some(inner) = trimmed.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            return (inner.trim().to_string(), Some(MatchType::Phrase));
        }
    }
    (trimmed.to_string(), None)
}

/// Negative keywords may also carry a leading `-`. An explicit match type
/// wins over punctuation; `Broad`/`Phrase`/`Exact` mean their negative form.
fn negative_from_text(raw: &str, explicit: Option<MatchType>) -> NegativeKeyword {
    let trimmed = raw.trim();
    let unprefixed = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let (keyword_text, punctuated) = strip_match_punctuation(unprefixed);
    let match_type = explicit
        .or(punctuated)
        .map(MatchType::to_negative)
        .unwrap_or(MatchType::NegativeBroad);
    NegativeKeyword::new(keyword_text, match_type)
}

fn parse_ad_kind(raw: &str) -> Option<AdKind> {
    match squash(raw).as_str() {
        "rsa" | "responsivesearch" | "responsivesearchad" => Some(AdKind::ResponsiveSearch),
        "dki" | "dynamickeyword" | "expandedtext" | "expandedtextad" | "eta" | "dkitext" => {
            Some(AdKind::DynamicKeyword)
        }
        "callonly" | "callonlyad" | "call" => Some(AdKind::CallOnly),
        _ => None,
    }
}

/// Ad copy lines from an array field or numbered flat keys; blanks dropped.
fn copy_lines(
    cx: &mut Context,
    fields: &Fields<'_>,
    list_keys: &[&str],
    prefix: &str,
    flat_max: usize,
) -> Vec<String> {
    if let Some(value) = fields.get(list_keys) {
        return match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Fields::new(map, String::new()).get(&["text"]).and_then(text),
                    other => text(other),
                })
                .collect(),
            _ => {
                cx.invalid(fields.path(list_keys[0]), "expected a list of text");
                Vec::new()
            }
        };
    }

    (1..=flat_max)
        .filter_map(|n| {
            let key = format!("{prefix}{n}");
            fields.get(&[key.as_str()]).and_then(text)
        })
        .collect()
}

fn location(cx: &mut Context, value: &Value, path: String) -> Option<LocationTarget> {
    match value {
        // Only postal codes are unambiguous as bare text; a name could be a
        // city, a state or a country.
        Value::String(_) | Value::Number(_) => {
            let raw = text(value)?;
            if looks_like_postal_code(&raw) {
                return Some(LocationTarget::new(LocationTargetType::PostalCode, raw));
            }
            cx.invalid(
                path,
                format!(
                    "'{raw}' is not a postal code; give named locations as \
                     {{ \"target_type\": \"city|state|country\", \"value\": \"{raw}\" }}"
                ),
            );
            None
        }
        Value::Object(map) => {
            let fields = Fields::new(map, path);
            let Some(raw_type) = fields.get(TARGET_TYPE).and_then(text) else {
                cx.missing(fields.path("target_type"), "location target type is required");
                return None;
            };
            let Some(target_type) = LocationTargetType::parse(&raw_type) else {
                cx.unrecognized(
                    fields.path("target_type"),
                    format!("unknown location target type '{raw_type}'"),
                );
                return None;
            };
            let Some(value) = fields.get(TARGET_VALUE).and_then(text) else {
                cx.missing(fields.path("value"), "location value is required");
                return None;
            };
            let bid_adjustment = fields
                .get(BID_ADJUSTMENT)
                .and_then(|v| number(cx, v, fields.path("bid_adjustment")));
            Some(LocationTarget {
                target_type,
                value,
                bid_adjustment,
            })
        }
        _ => {
            cx.invalid(path, "expected a location target");
            None
        }
    }
}

fn looks_like_postal_code(raw: &str) -> bool {
    raw.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false)
        && raw.chars().all(|c| c.is_ascii_digit() || c == '-')
}

fn sitelink(cx: &mut Context, value: &Value, path: String) -> Option<Sitelink> {
    let fields = cx.object(value, path)?;
    let Some(link_text) = fields.get(SITELINK_TEXT).and_then(text) else {
        cx.missing(fields.path("text"), "sitelink text is required");
        return None;
    };
    Some(Sitelink {
        text: link_text,
        description1: fields.get(SITELINK_DESCRIPTION1).and_then(text),
        description2: fields.get(SITELINK_DESCRIPTION2).and_then(text),
        final_url: fields.get(SITELINK_URL).and_then(text).unwrap_or_default(),
    })
}

fn callout(cx: &mut Context, value: &Value, path: String) -> Option<Callout> {
    let raw = match value {
        Value::Object(map) => {
            let fields = Fields::new(map, path.clone());
            fields.get(CALLOUT_TEXT).and_then(text)
        }
        other => text(other),
    };
    match raw {
        Some(t) => Some(Callout { text: t }),
        None => {
            cx.missing(path, "callout text is required");
            None
        }
    }
}

fn structured_snippet(cx: &mut Context, value: &Value, path: String) -> Option<StructuredSnippet> {
    let fields = cx.object(value, path)?;
    let Some(header) = fields.get(SNIPPET_HEADER).and_then(text) else {
        cx.missing(fields.path("header"), "structured snippet header is required");
        return None;
    };
    let values = fields
        .get(SNIPPET_VALUES)
        .map(|v| string_list(cx, v, fields.path("values")))
        .unwrap_or_default();
    Some(StructuredSnippet { header, values })
}

fn call_extension(cx: &mut Context, value: &Value, path: String) -> Option<CallExtension> {
    let fields = cx.object(value, path)?;
    Some(CallExtension {
        phone_number: fields.get(PHONE).and_then(text).unwrap_or_default(),
        country_code: fields
            .get(COUNTRY_CODE)
            .and_then(text)
            .unwrap_or_else(|| "US".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(input: Value) -> Result<CampaignStructure, NormalizationError> {
        let config = ExportConfig::default();
        Normalizer::new(&config).normalize(&input)
    }

    #[test]
    fn test_snake_and_camel_case_keys_are_equivalent() {
        let snake = normalize(json!({
            "campaigns": [{
                "campaign_name": "Plumbing",
                "bidding_strategy": "Maximize Clicks",
                "ad_groups": [{ "adgroup_name": "Drains", "keywords": ["drain cleaning"] }]
            }]
        }))
        .unwrap();
        let camel = normalize(json!({
            "campaigns": [{
                "campaignName": "Plumbing",
                "biddingStrategy": "Maximize Clicks",
                "adGroups": [{ "adGroupName": "Drains", "keywords": ["drain cleaning"] }]
            }]
        }))
        .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(
            snake.campaigns[0].bidding_strategy,
            BiddingStrategy::MaximizeClicks
        );
    }

    #[test]
    fn test_defaults_applied() {
        let structure = normalize(json!({
            "campaigns": [{
                "campaign_name": "Defaults",
                "adgroups": [{ "adgroup_name": "G", "keywords": ["plumber"], "negative_keywords": null }]
            }]
        }))
        .unwrap();
        let campaign = &structure.campaigns[0];
        assert_eq!(campaign.bidding_strategy, BiddingStrategy::ManualCpc);
        assert_eq!(campaign.budget_type, BudgetType::Daily);
        assert!(campaign.negative_keywords.is_empty());
        let group = &campaign.ad_groups[0];
        assert!(group.negative_keywords.is_empty());
        assert_eq!(group.keywords, vec![Keyword::new("plumber", MatchType::Broad)]);
    }

    #[test]
    fn test_keywords_expand_over_match_types_unless_punctuated() {
        let structure = normalize(json!({
            "campaigns": [{
                "campaign_name": "C",
                "adgroups": [{
                    "adgroup_name": "G",
                    "keywords": ["locksmith", "\"emergency plumber\"", "[24/7 plumber]"],
                    "match_types": ["Broad", "Exact"]
                }]
            }]
        }))
        .unwrap();
        let keywords = &structure.campaigns[0].ad_groups[0].keywords;
        assert_eq!(
            keywords,
            &vec![
                Keyword::new("locksmith", MatchType::Broad),
                Keyword::new("locksmith", MatchType::Exact),
                Keyword::new("emergency plumber", MatchType::Phrase),
                Keyword::new("24/7 plumber", MatchType::Exact),
            ]
        );
    }

    #[test]
    fn test_match_type_object_of_flags() {
        let structure = normalize(json!({
            "campaigns": [{
                "campaign_name": "C",
                "adgroups": [{
                    "adgroup_name": "G",
                    "keywords": ["roofer"],
                    "matchTypes": { "broad": false, "phrase": true, "exact": true }
                }]
            }]
        }))
        .unwrap();
        let types: Vec<MatchType> = structure.campaigns[0].ad_groups[0]
            .keywords
            .iter()
            .map(|k| k.match_type)
            .collect();
        assert!(types.contains(&MatchType::Phrase));
        assert!(types.contains(&MatchType::Exact));
        assert!(!types.contains(&MatchType::Broad));
    }

    #[test]
    fn test_negative_keyword_notation() {
        let structure = normalize(json!({
            "campaigns": [{
                "campaign_name": "C",
                "negative_keywords": ["free", "-\"diy kit\"", "[jobs]", { "text": "cheap", "match_type": "Exact" }],
                "adgroups": []
            }]
        }))
        .unwrap();
        let negatives = &structure.campaigns[0].negative_keywords;
        assert_eq!(
            negatives,
            &vec![
                NegativeKeyword::new("free", MatchType::NegativeBroad),
                NegativeKeyword::new("diy kit", MatchType::NegativePhrase),
                NegativeKeyword::new("jobs", MatchType::NegativeExact),
                NegativeKeyword::new("cheap", MatchType::NegativeExact),
            ]
        );
    }

    #[test]
    fn test_flat_and_nested_ad_copy() {
        let structure = normalize(json!({
            "campaigns": [{
                "campaign_name": "C",
                "adgroups": [{
                    "adgroup_name": "G",
                    "ads": [
                        {
                            "headline1": "One", "headline2": "", "headline3": "Three",
                            "description1": "Desc", "final_url": "https://example.com"
                        },
                        {
                            "type": "rsa",
                            "headlines": ["A", { "text": "B" }, "  "],
                            "descriptions": ["D1", "D2"],
                            "finalUrl": "https://example.com"
                        }
                    ]
                }]
            }]
        }))
        .unwrap();
        let ads = &structure.campaigns[0].ad_groups[0].ads;
        assert_eq!(ads[0].headlines(), &["One".to_string(), "Three".to_string()]);
        assert_eq!(ads[1].headlines(), &["A".to_string(), "B".to_string()]);
        assert_eq!(ads[1].final_url(), Some("https://example.com"));
    }

    #[test]
    fn test_dki_inferred_from_macro() {
        let structure = normalize(json!({
            "campaigns": [{
                "campaign_name": "C",
                "adgroups": [{
                    "adgroup_name": "G",
                    "ads": [{ "headline1": "{KeyWord:Locksmith} Near You", "final_url": "https://example.com" }]
                }]
            }]
        }))
        .unwrap();
        assert!(matches!(
            structure.campaigns[0].ad_groups[0].ads[0],
            Ad::DynamicKeyword(_)
        ));
    }

    #[test]
    fn test_locations_from_zip_city_state_and_country() {
        let structure = normalize(json!({
            "campaigns": [
                {
                    "campaign_name": "Local",
                    "zip_codes": ["10001", 90210],
                    "cities": "Austin, Denver",
                    "adgroups": []
                },
                {
                    "campaign_name": "National",
                    "location_type": "COUNTRY",
                    "location_code": "US",
                    "adgroups": []
                }
            ]
        }))
        .unwrap();
        let local = &structure.campaigns[0].locations;
        assert_eq!(local.len(), 4);
        assert_eq!(local[1], LocationTarget::new(LocationTargetType::PostalCode, "90210"));
        assert_eq!(local[3], LocationTarget::new(LocationTargetType::City, "Denver"));
        assert_eq!(
            structure.campaigns[1].locations,
            vec![LocationTarget::new(LocationTargetType::Country, "US")]
        );
    }

    #[test]
    fn test_bare_location_names_are_rejected() {
        let err = normalize(json!({
            "campaign_name": "C",
            "locations": [
                "Texas",
                "90210",
                { "target_type": "state", "value": "Texas" },
                "United States"
            ],
            "ad_groups": []
        }))
        .unwrap_err();
        assert_eq!(err.problems.len(), 2);
        assert!(err.problems.iter().all(|p| p.kind == ProblemKind::InvalidValue));
        assert_eq!(err.problems[0].path, "campaigns[0].locations[0]");
        assert!(err.problems[0].message.contains("target_type"));
        assert_eq!(err.problems[1].path, "campaigns[0].locations[3]");

        let structure = normalize(json!({
            "campaign_name": "C",
            "locations": ["90210", { "target_type": "country", "value": "United States" }],
            "ad_groups": []
        }))
        .unwrap();
        assert_eq!(
            structure.campaigns[0].locations,
            vec![
                LocationTarget::new(LocationTargetType::PostalCode, "90210"),
                LocationTarget::new(LocationTargetType::Country, "United States"),
            ]
        );
    }

    #[test]
    fn test_ad_extensions_hoisted_to_campaign() {
        let structure = normalize(json!({
            "campaigns": [{
                "campaign_name": "C",
                "callouts": ["Free Estimates"],
                "adgroups": [{
                    "adgroup_name": "G",
                    "ads": [{
                        "headline1": "H",
                        "final_url": "https://example.com",
                        "extensions": [
                            { "extensionType": "sitelink", "links": [{ "text": "Pricing", "url": "https://example.com/pricing" }] },
                            { "type": "call", "phone": "555-0100" }
                        ]
                    }]
                }]
            }]
        }))
        .unwrap();
        let extensions = &structure.campaigns[0].extensions;
        assert_eq!(extensions.len(), 3);
        assert!(matches!(&extensions[0], Extension::Callout(c) if c.text == "Free Estimates"));
        assert!(matches!(&extensions[1], Extension::Sitelink(s) if s.text == "Pricing"));
        assert!(matches!(&extensions[2], Extension::Call(c) if c.phone_number == "555-0100"));
    }

    #[test]
    fn test_missing_required_fields_all_reported() {
        let err = normalize(json!({
            "campaigns": [
                { "budget": "abc", "adgroups": [{ "keywords": ["x"] }] },
                { "campaign_name": "No groups" }
            ]
        }))
        .unwrap_err();
        let paths: Vec<&str> = err.problems.iter().map(|p| p.path.as_str()).collect();
        assert!(paths.contains(&"campaigns[0].campaign_name"));
        assert!(paths.contains(&"campaigns[0].budget"));
        assert!(paths.contains(&"campaigns[0].ad_groups[0].adgroup_name"));
        assert!(paths.contains(&"campaigns[1].ad_groups"));
        assert_eq!(err.problems.len(), 4);
    }

    #[test]
    fn test_unrecognized_values_rejected() {
        let err = normalize(json!({
            "campaigns": [{
                "campaign_name": "C",
                "bidding_strategy": "Guess",
                "adgroups": [{
                    "adgroup_name": "G",
                    "match_types": ["Fuzzy"],
                    "ads": [{ "type": "banner" }]
                }]
            }]
        }))
        .unwrap_err();
        assert!(err
            .problems
            .iter()
            .all(|p| p.kind == ProblemKind::Unrecognized));
        assert_eq!(err.problems.len(), 3);
    }

    #[test]
    fn test_unknown_fields_only_rejected_when_strict() {
        let input = json!({
            "campaigns": [{ "campaign_name": "C", "colour": "blue", "adgroups": [] }]
        });
        assert!(normalize(input.clone()).is_ok());

        let config = ExportConfig {
            reject_unknown_fields: true,
            ..ExportConfig::default()
        };
        let err = Normalizer::new(&config).normalize(&input).unwrap_err();
        assert_eq!(err.problems[0].path, "campaigns[0].colour");
        assert_eq!(err.problems[0].kind, ProblemKind::Unrecognized);
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = normalize(json!({ "campaigns": [] })).unwrap_err();
        assert_eq!(err.problems[0].kind, ProblemKind::Missing);
        assert!(normalize(json!("nope")).is_err());
    }

    #[test]
    fn test_strip_match_punctuation() {
        assert_eq!(
            strip_match_punctuation("\"emergency plumber\""),
            ("emergency plumber".to_string(), Some(MatchType::Phrase))
        );
        assert_eq!(
            strip_match_punctuation("[exact]"),
            ("exact".to_string(), Some(MatchType::Exact))
        );
        assert_eq!(strip_match_punctuation("broad"), ("broad".to_string(), None));
        assert_eq!(strip_match_punctuation("[]"), (String::new(), Some(MatchType::Exact)));
    }
}
