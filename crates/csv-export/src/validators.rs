//! Field validators.
//!
//! Validators never fail: every rule appends zero or more [`ValidationIssue`]s
//! and the export orchestrator alone decides whether error-severity issues
//! block the export. The per-field functions are public so callers (and tests)
//! can check a single value against the entity it belongs to; [`Validator`]
//! walks a whole [`CampaignStructure`].

use std::collections::HashSet;
use std::fmt::Display;

use adiology_core::types::{
    Ad, AdGroup, CallOnlyAd, Campaign, CampaignStructure, DynamicKeywordAd, Extension, Keyword,
    LocationTarget, LocationTargetType, MatchType, NegativeKeyword, ResponsiveSearchAd,
};
use adiology_core::ExportConfig;
use url::Url;

use crate::dki::{self, BraceProblem};
use crate::issue::ValidationIssue;

/// Bid adjustments are percentages in Google Ads' accepted range.
pub const MIN_BID_ADJUSTMENT: f64 = -90.0;
pub const MAX_BID_ADJUSTMENT: f64 = 900.0;

const RSA_MAX_HEADLINES: usize = 15;
const RSA_MAX_DESCRIPTIONS: usize = 4;
const RSA_MIN_HEADLINES: usize = 3;
const RSA_MIN_DESCRIPTIONS: usize = 2;
const BUSINESS_NAME_MAX_CHARS: usize = 25;
const SNIPPET_MIN_VALUES: usize = 3;
const SNIPPET_VALUE_MAX_CHARS: usize = 25;

// ─── Scopes ─────────────────────────────────────────────────────────────────

/// The entity a value belongs to: a human-readable breadcrumb
/// (`Campaign "X" > Ad Group "Y"`), its dotted path, and its position in the
/// parent list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub owner: String,
    pub path: String,
    pub row_index: Option<usize>,
}

impl Scope {
    pub fn new(owner: impl Into<String>, path: impl Into<String>, row_index: Option<usize>) -> Self {
        Self {
            owner: owner.into(),
            path: path.into(),
            row_index,
        }
    }

    pub fn child(&self, owner: impl Display, segment: &str, row_index: Option<usize>) -> Scope {
        Scope {
            owner: format!("{} > {owner}", self.owner),
            path: format!("{}.{segment}", self.path),
            row_index,
        }
    }

    /// A named field of this entity.
    pub fn field(&self, name: impl Into<String>, segment: &str) -> Field<'_> {
        self.field_at(name, segment, self.row_index)
    }

    /// A field addressing one element of a list held by this entity.
    pub fn field_at(
        &self,
        name: impl Into<String>,
        segment: &str,
        row_index: Option<usize>,
    ) -> Field<'_> {
        Field {
            owner: &self.owner,
            name: name.into(),
            path: format!("{}.{segment}", self.path),
            row_index,
        }
    }
}

/// One field being validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    pub owner: &'a str,
    pub name: String,
    pub path: String,
    pub row_index: Option<usize>,
}

impl Field<'_> {
    pub fn error(&self, detail: impl Display) -> ValidationIssue {
        ValidationIssue::error(
            self.path.clone(),
            self.row_index,
            format!("{}: {} {detail}", self.owner, self.name),
        )
    }

    pub fn warning(&self, detail: impl Display) -> ValidationIssue {
        ValidationIssue::warning(
            self.path.clone(),
            self.row_index,
            format!("{}: {} {detail}", self.owner, self.name),
        )
    }
}

// ─── Field rules ────────────────────────────────────────────────────────────

/// Headline length counts literal characters only; macro text is excluded.
/// Malformed braces are reported once and skip the length check.
pub fn headline(text: &str, field: &Field<'_>, max_chars: usize) -> Vec<ValidationIssue> {
    copy_line(text, field, max_chars, |t| dki::scan(t).literal_chars)
}

/// Description length counts every character, macro text included.
pub fn description(text: &str, field: &Field<'_>, max_chars: usize) -> Vec<ValidationIssue> {
    copy_line(text, field, max_chars, |t| t.chars().count())
}

fn copy_line(
    text: &str,
    field: &Field<'_>,
    max_chars: usize,
    length_of: impl Fn(&str) -> usize,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if text.contains(['{', '}']) {
        issues.extend(dki_syntax(text, field));
        if !issues.is_empty() {
            return issues;
        }
    }
    let length = length_of(text);
    if length > max_chars {
        issues.push(field.warning(format!("is {length} characters (limit {max_chars})")));
    }
    issues
}

/// Brace balance, nesting and default text of `{KeyWord:Default}` macros.
/// Reports at most one structural problem per text.
pub fn dki_syntax(text: &str, field: &Field<'_>) -> Vec<ValidationIssue> {
    let scan = dki::scan(text);
    match scan.problem {
        Some(BraceProblem::Unbalanced) => {
            return vec![field.error("has unbalanced braces in a {KeyWord:Default Text} macro")]
        }
        Some(BraceProblem::Nested) => {
            return vec![field.error("has nested braces, which keyword insertion does not allow")]
        }
        None => {}
    }
    scan.macros
        .iter()
        .filter(|m| match &m.default_text {
            Some(_) => !m.has_default(),
            None => m.is_keyword(),
        })
        .map(|m| {
            field.error(format!(
                "has a {{{}}} macro with no default text after the colon",
                m.name.trim()
            ))
        })
        .collect()
}

/// Landing-page URL rules. `required` controls whether an empty value is an error.
pub fn url(value: &str, field: &Field<'_>, required: bool) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if value.trim().is_empty() {
        if required {
            issues.push(field.error("is required"));
        }
        return issues;
    }
    if value.chars().any(char::is_whitespace) {
        issues.push(field.error("contains whitespace"));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push(field.error("contains uppercase letters"));
    }
    if value.contains(['{', '}']) {
        issues.push(field.error("contains a DKI placeholder"));
    }
    match Url::parse(value.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {}
        _ => issues.push(field.error(format!("'{value}' is not a valid http(s) URL"))),
    }
    issues
}

pub fn keyword_match_type(match_type: MatchType, field: &Field<'_>) -> Vec<ValidationIssue> {
    if match_type.is_negative() {
        vec![field.error(format!(
            "'{}' is not allowed for keywords (use Broad, Phrase or Exact)",
            match_type.display_name()
        ))]
    } else {
        Vec::new()
    }
}

pub fn negative_match_type(match_type: MatchType, field: &Field<'_>) -> Vec<ValidationIssue> {
    if match_type.is_negative() {
        Vec::new()
    } else {
        vec![field.error(format!(
            "'{}' is not allowed for negative keywords (use Negative Broad, Negative Phrase or Negative Exact)",
            match_type.display_name()
        ))]
    }
}

pub fn keyword_count(count: usize, field: &Field<'_>, max: usize) -> Vec<ValidationIssue> {
    if count > max {
        vec![field.warning(format!(
            "has {count} keywords; Google Ads Editor handles at most {max} per ad group"
        ))]
    } else {
        Vec::new()
    }
}

pub fn display_path(value: &str, field: &Field<'_>, max_chars: usize) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let length = value.chars().count();
    if length > max_chars {
        issues.push(field.warning(format!("is {length} characters (limit {max_chars})")));
    }
    if value.contains(' ') {
        issues.push(field.warning("should not contain spaces"));
    }
    issues
}

pub fn phone_number(value: &str, field: &Field<'_>) -> Vec<ValidationIssue> {
    if value.trim().is_empty() {
        return vec![field.error("is required")];
    }
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' '));
    if !allowed || !value.chars().any(|c| c.is_ascii_digit()) {
        return vec![field.error(format!("'{value}' is not a valid phone number"))];
    }
    Vec::new()
}

/// `NNNNN` or `NNNNN-NNNN`.
pub fn is_valid_postal_code(value: &str) -> bool {
    let bytes = value.as_bytes();
    let digits = |b: &[u8]| b.iter().all(u8::is_ascii_digit);
    match bytes.len() {
        5 => digits(bytes),
        10 => digits(&bytes[..5]) && bytes[5] == b'-' && digits(&bytes[6..]),
        _ => false,
    }
}

pub fn bid_adjustment(value: f64, field: &Field<'_>) -> Vec<ValidationIssue> {
    if (MIN_BID_ADJUSTMENT..=MAX_BID_ADJUSTMENT).contains(&value) {
        Vec::new()
    } else {
        vec![field.error(format!(
            "{value}% is outside the allowed range ({MIN_BID_ADJUSTMENT}% to +{MAX_BID_ADJUSTMENT}%)"
        ))]
    }
}

fn max_chars(value: &str, field: &Field<'_>, max: usize) -> Option<ValidationIssue> {
    let length = value.chars().count();
    (length > max).then(|| field.error(format!("is {length} characters (limit {max})")))
}

// ─── Structure walk ─────────────────────────────────────────────────────────

/// Applies every rule to a normalized structure.
#[derive(Debug, Clone)]
pub struct Validator<'c> {
    config: &'c ExportConfig,
}

impl<'c> Validator<'c> {
    pub fn new(config: &'c ExportConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, structure: &CampaignStructure) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if structure.campaigns.is_empty() {
            issues.push(ValidationIssue::error(
                "campaigns",
                None,
                "At least one campaign is required",
            ));
        }

        let mut names = HashSet::new();
        for (ci, campaign) in structure.campaigns.iter().enumerate() {
            let scope = Scope::new(
                format!("Campaign \"{}\"", campaign.name),
                format!("campaigns[{ci}]"),
                Some(ci),
            );
            if !campaign.name.trim().is_empty() && !names.insert(campaign.name.trim()) {
                issues.push(
                    scope
                        .field("Campaign name", "name")
                        .error("is used by more than one campaign in this export"),
                );
            }
            self.campaign(campaign, &scope, &mut issues);
        }
        issues
    }

    fn campaign(&self, campaign: &Campaign, scope: &Scope, issues: &mut Vec<ValidationIssue>) {
        let name = scope.field("Campaign name", "name");
        if campaign.name.trim().is_empty() {
            issues.push(name.error("is required"));
        }
        issues.extend(max_chars(&campaign.name, &name, self.config.name_max_chars));

        if let Some(budget) = campaign.budget {
            if budget <= 0.0 {
                issues.push(scope.field("Budget", "budget").error("must be greater than 0"));
            }
        }
        if let (Some(start), Some(end)) = (campaign.start_date, campaign.end_date) {
            if end < start {
                issues.push(
                    scope
                        .field("End date", "end_date")
                        .error(format!("{end} is before the start date {start}")),
                );
            }
        }

        for (i, negative) in campaign.negative_keywords.iter().enumerate() {
            self.negative(negative, scope, i, issues);
        }

        if campaign.ad_groups.is_empty() {
            issues.push(scope.field("Ad groups", "ad_groups").error("must include at least one ad group"));
        }
        let mut group_names = HashSet::new();
        for (gi, group) in campaign.ad_groups.iter().enumerate() {
            let group_scope = scope.child(
                format!("Ad Group \"{}\"", group.name),
                &format!("ad_groups[{gi}]"),
                Some(gi),
            );
            if !group.name.trim().is_empty() && !group_names.insert(group.name.trim()) {
                issues.push(
                    group_scope
                        .field("Ad group name", "name")
                        .error("is used by more than one ad group in this campaign"),
                );
            }
            self.ad_group(group, &group_scope, issues);
        }

        self.locations(&campaign.locations, scope, issues);

        for (i, extension) in campaign.extensions.iter().enumerate() {
            self.extension(extension, scope, i, issues);
        }
    }

    fn ad_group(&self, group: &AdGroup, scope: &Scope, issues: &mut Vec<ValidationIssue>) {
        let name = scope.field("Ad group name", "name");
        if group.name.trim().is_empty() {
            issues.push(name.error("is required"));
        }
        issues.extend(max_chars(&group.name, &name, self.config.name_max_chars));

        if group.keywords.is_empty() {
            issues.push(scope.field("Keywords", "keywords").warning("list is empty"));
        }
        issues.extend(keyword_count(
            group.keywords.len(),
            &scope.field("Ad group", "keywords"),
            self.config.max_keywords_per_ad_group,
        ));

        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for (ki, keyword) in group.keywords.iter().enumerate() {
            self.keyword(keyword, scope, ki, issues);
            let key = (keyword.text.to_lowercase(), keyword.match_type);
            if !seen.insert(key.clone()) && reported.insert(key) {
                issues.push(
                    scope
                        .field_at(
                            format!("Keyword \"{}\"", keyword.text),
                            &format!("keywords[{ki}]"),
                            Some(ki),
                        )
                        .warning(format!(
                            "appears more than once as {}",
                            keyword.match_type.display_name()
                        )),
                );
            }
        }

        for (i, negative) in group.negative_keywords.iter().enumerate() {
            self.negative(negative, scope, i, issues);
        }

        if group.ads.is_empty() {
            issues.push(scope.field("Ads", "ads").warning("list is empty"));
        }
        for (ai, ad) in group.ads.iter().enumerate() {
            let ad_scope = scope.child(format!("Ad #{}", ai + 1), &format!("ads[{ai}]"), Some(ai));
            self.ad(ad, &ad_scope, issues);
        }
    }

    fn keyword(&self, keyword: &Keyword, scope: &Scope, ki: usize, issues: &mut Vec<ValidationIssue>) {
        let segment = format!("keywords[{ki}]");
        let field = scope.field_at(format!("Keyword #{}", ki + 1), &segment, Some(ki));
        if keyword.text.trim().is_empty() {
            issues.push(field.error("is empty after removing match-type punctuation"));
        }
        issues.extend(max_chars(&keyword.text, &field, self.config.keyword_max_chars));
        issues.extend(keyword_match_type(keyword.match_type, &field));
        if let Some(cpc) = keyword.max_cpc {
            if cpc <= 0.0 {
                issues.push(field.error("max CPC must be greater than 0"));
            }
        }
        if let Some(final_url) = &keyword.final_url {
            let url_field = scope.field_at(
                format!("Keyword #{} final URL", ki + 1),
                &format!("{segment}.final_url"),
                Some(ki),
            );
            issues.extend(url(final_url, &url_field, false));
        }
    }

    fn negative(
        &self,
        negative: &NegativeKeyword,
        scope: &Scope,
        i: usize,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let field = scope.field_at(
            format!("Negative keyword #{}", i + 1),
            &format!("negative_keywords[{i}]"),
            Some(i),
        );
        if negative.text.trim().is_empty() {
            issues.push(field.error("is empty"));
        }
        issues.extend(max_chars(&negative.text, &field, self.config.keyword_max_chars));
        issues.extend(negative_match_type(negative.match_type, &field));
    }

    // ─── Ads ────────────────────────────────────────────────────────────

    fn ad(&self, ad: &Ad, scope: &Scope, issues: &mut Vec<ValidationIssue>) {
        match ad {
            Ad::ResponsiveSearch(rsa) => self.responsive_search_ad(rsa, scope, issues),
            Ad::DynamicKeyword(dki_ad) => self.dynamic_keyword_ad(dki_ad, scope, issues),
            Ad::CallOnly(call) => self.call_only_ad(call, scope, issues),
        }
        self.copy(ad, scope, issues);
        if !matches!(ad, Ad::CallOnly(_)) {
            self.landing_page(ad, scope, issues);
        }
    }

    fn copy(&self, ad: &Ad, scope: &Scope, issues: &mut Vec<ValidationIssue>) {
        for (i, text) in ad.headlines().iter().enumerate() {
            let field = scope.field(format!("Headline {}", i + 1), &format!("headline_{}", i + 1));
            issues.extend(headline(text, &field, self.config.headline_max_chars));
        }
        for (i, text) in ad.descriptions().iter().enumerate() {
            let field = scope.field(
                format!("Description {}", i + 1),
                &format!("description_{}", i + 1),
            );
            issues.extend(description(text, &field, self.config.description_max_chars));
        }
    }

    fn landing_page(&self, ad: &Ad, scope: &Scope, issues: &mut Vec<ValidationIssue>) {
        issues.extend(url(
            ad.final_url().unwrap_or_default(),
            &scope.field("Final URL", "final_url"),
            true,
        ));
        if let Some(mobile) = ad.final_mobile_url() {
            issues.extend(url(mobile, &scope.field("Final mobile URL", "final_mobile_url"), false));
        }
        let (path1, path2) = ad.paths();
        for (n, path) in [(1, path1), (2, path2)] {
            if let Some(path) = path {
                issues.extend(display_path(
                    path,
                    &scope.field(format!("Path {n}"), &format!("path{n}")),
                    self.config.path_max_chars,
                ));
            }
        }
    }

    fn responsive_search_ad(
        &self,
        rsa: &ResponsiveSearchAd,
        scope: &Scope,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let headlines = scope.field("Headlines", "headlines");
        match rsa.headlines.len() {
            0 => issues.push(headlines.error("are required (at least 1)")),
            n if n < RSA_MIN_HEADLINES => issues.push(headlines.warning(format!(
                "count is {n}; responsive search ads should have at least {RSA_MIN_HEADLINES}"
            ))),
            n if n > RSA_MAX_HEADLINES => issues.push(headlines.error(format!(
                "count is {n}; responsive search ads allow at most {RSA_MAX_HEADLINES}"
            ))),
            _ => {}
        }
        let descriptions = scope.field("Descriptions", "descriptions");
        match rsa.descriptions.len() {
            0 => issues.push(descriptions.error("are required (at least 1)")),
            n if n < RSA_MIN_DESCRIPTIONS => issues.push(descriptions.warning(format!(
                "count is {n}; responsive search ads should have at least {RSA_MIN_DESCRIPTIONS}"
            ))),
            n if n > RSA_MAX_DESCRIPTIONS => issues.push(descriptions.error(format!(
                "count is {n}; responsive search ads allow at most {RSA_MAX_DESCRIPTIONS}"
            ))),
            _ => {}
        }
    }

    fn dynamic_keyword_ad(
        &self,
        dki_ad: &DynamicKeywordAd,
        scope: &Scope,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let headlines = scope.field("Headlines", "headlines");
        if dki_ad.headlines.is_empty() {
            issues.push(headlines.error("are required (at least 1)"));
        } else if dki_ad.headlines.len() > DynamicKeywordAd::MAX_HEADLINES {
            issues.push(headlines.warning(format!(
                "count is {}; only the first {} are exported for expanded text ads",
                dki_ad.headlines.len(),
                DynamicKeywordAd::MAX_HEADLINES
            )));
        }
        let descriptions = scope.field("Descriptions", "descriptions");
        if dki_ad.descriptions.is_empty() {
            issues.push(descriptions.error("are required (at least 1)"));
        } else if dki_ad.descriptions.len() > DynamicKeywordAd::MAX_DESCRIPTIONS {
            issues.push(descriptions.warning(format!(
                "count is {}; only the first {} are exported for expanded text ads",
                dki_ad.descriptions.len(),
                DynamicKeywordAd::MAX_DESCRIPTIONS
            )));
        }

        let has_keyword_macro = dki_ad
            .headlines
            .iter()
            .chain(dki_ad.descriptions.iter())
            .any(|line| dki::contains_keyword_macro(line));
        if !has_keyword_macro {
            issues.push(
                scope
                    .field("DKI ad", "headline_1")
                    .error("must contain a {KeyWord:Default Text} macro"),
            );
        }
    }

    fn call_only_ad(&self, call: &CallOnlyAd, scope: &Scope, issues: &mut Vec<ValidationIssue>) {
        let business = scope.field("Business name", "business_name");
        if call.business_name.trim().is_empty() {
            issues.push(business.error("is required"));
        } else if call.business_name.chars().count() > BUSINESS_NAME_MAX_CHARS {
            issues.push(business.warning(format!(
                "is {} characters (limit {BUSINESS_NAME_MAX_CHARS})",
                call.business_name.chars().count()
            )));
        }
        issues.extend(phone_number(
            &call.phone_number,
            &scope.field("Phone number", "phone_number"),
        ));

        let headlines = scope.field("Headlines", "headlines");
        if call.headlines.len() > CallOnlyAd::MAX_HEADLINES {
            issues.push(headlines.warning(format!(
                "count is {}; only the first {} are exported for call-only ads",
                call.headlines.len(),
                CallOnlyAd::MAX_HEADLINES
            )));
        }
        let descriptions = scope.field("Descriptions", "descriptions");
        if call.descriptions.len() > CallOnlyAd::MAX_DESCRIPTIONS {
            issues.push(descriptions.warning(format!(
                "count is {}; only the first {} are exported for call-only ads",
                call.descriptions.len(),
                CallOnlyAd::MAX_DESCRIPTIONS
            )));
        }

        if let Some(verification) = &call.verification_url {
            issues.extend(url(
                verification,
                &scope.field("Verification URL", "verification_url"),
                false,
            ));
        }
    }

    // ─── Locations ──────────────────────────────────────────────────────

    fn locations(
        &self,
        locations: &[LocationTarget],
        scope: &Scope,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let total = locations.len();
        let field = scope.field("Location targets", "locations");
        if total > self.config.max_location_targets {
            issues.push(field.error(format!(
                "count is {total}; Google Ads Editor accepts at most {} per campaign",
                self.config.max_location_targets
            )));
        } else if total > self.config.location_warning_threshold {
            issues.push(field.warning(format!(
                "count is {total}; imports above {} targets are slow and may time out",
                self.config.location_warning_threshold
            )));
        }

        let mut seen: HashSet<(LocationTargetType, String)> = HashSet::with_capacity(total);
        let mut reported = HashSet::new();
        for (i, target) in locations.iter().enumerate() {
            let value = target.value.trim();
            let target_field = move || {
                scope.field_at(
                    format!("{} \"{}\"", target.target_type.display_name(), target.value),
                    &format!("locations[{i}]"),
                    Some(i),
                )
            };

            if value.is_empty() {
                issues.push(target_field().error("has no value"));
                continue;
            }
            if target.target_type == LocationTargetType::PostalCode && !is_valid_postal_code(value)
            {
                issues.push(target_field().error("is not a valid ZIP code (expected 12345 or 12345-6789)"));
            }
            if let Some(adjustment) = target.bid_adjustment {
                issues.extend(bid_adjustment(adjustment, &target_field()));
            }

            let key = (target.target_type, value.to_lowercase());
            if !seen.insert(key.clone()) && reported.insert(key) {
                issues.push(target_field().warning("is listed more than once and will be exported once"));
            }
        }
    }

    // ─── Extensions ─────────────────────────────────────────────────────

    fn extension(
        &self,
        extension: &Extension,
        scope: &Scope,
        i: usize,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let segment = format!("extensions[{i}]");
        let part = move |name: &str, sub: &str| {
            scope.field_at(name.to_string(), &format!("{segment}.{sub}"), Some(i))
        };

        match extension {
            Extension::Sitelink(link) => {
                let text = part("Sitelink text", "text");
                if link.text.trim().is_empty() {
                    issues.push(text.error("is required"));
                }
                issues.extend(max_chars(&link.text, &text, self.config.sitelink_text_max_chars));
                for (n, line) in [(1, &link.description1), (2, &link.description2)] {
                    if let Some(line) = line {
                        issues.extend(max_chars(
                            line,
                            &part(&format!("Sitelink description {n}"), &format!("description{n}")),
                            self.config.sitelink_description_max_chars,
                        ));
                    }
                }
                issues.extend(url(&link.final_url, &part("Sitelink final URL", "final_url"), true));
            }
            Extension::Callout(callout) => {
                let text = part("Callout text", "text");
                if callout.text.trim().is_empty() {
                    issues.push(text.error("is required"));
                }
                issues.extend(max_chars(&callout.text, &text, self.config.callout_max_chars));
            }
            Extension::StructuredSnippet(snippet) => {
                if snippet.header.trim().is_empty() {
                    issues.push(part("Structured snippet header", "header").error("is required"));
                }
                let values = part("Structured snippet values", "values");
                if snippet.values.len() < SNIPPET_MIN_VALUES {
                    issues.push(values.warning(format!(
                        "count is {}; at least {SNIPPET_MIN_VALUES} are recommended",
                        snippet.values.len()
                    )));
                }
                for value in &snippet.values {
                    let length = value.chars().count();
                    if length > SNIPPET_VALUE_MAX_CHARS {
                        issues.push(values.warning(format!(
                            "entry '{value}' is {length} characters (limit {SNIPPET_VALUE_MAX_CHARS})"
                        )));
                    }
                }
            }
            Extension::Call(call) => {
                let phone = part("Call extension phone number", "phone_number");
                if call.phone_number.trim().is_empty() {
                    issues.push(phone.error("is required for call extensions"));
                } else {
                    issues.extend(phone_number(&call.phone_number, &phone));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;
    use adiology_core::types::{CallExtension, Callout, Sitelink, StructuredSnippet};

    fn sample_scope() -> Scope {
        Scope::new(
            "Campaign \"Locks\" > Ad Group \"Emergency\" > Ad #1",
            "campaigns[0].ad_groups[0].ads[0]",
            Some(0),
        )
    }

    fn sample_rsa() -> ResponsiveSearchAd {
        ResponsiveSearchAd {
            headlines: vec![
                "24/7 Emergency Locksmith".to_string(),
                "Fast Response Time".to_string(),
                "Licensed & Insured".to_string(),
            ],
            descriptions: vec![
                "Locked out? We arrive in 30 minutes or less.".to_string(),
                "Residential and commercial lockouts handled.".to_string(),
            ],
            path1: Some("locksmith".to_string()),
            path2: Some("emergency".to_string()),
            final_url: "https://example.com/locksmith".to_string(),
            final_mobile_url: None,
            status: Default::default(),
        }
    }

    fn sample_campaign() -> Campaign {
        let mut group = AdGroup::named("Emergency");
        group.keywords = vec![Keyword::new("locksmith near me", MatchType::Phrase)];
        group.ads = vec![Ad::ResponsiveSearch(sample_rsa())];
        let mut campaign = Campaign::named("Locks");
        campaign.ad_groups = vec![group];
        campaign
    }

    fn validate(campaigns: Vec<Campaign>) -> Vec<ValidationIssue> {
        let config = ExportConfig::default();
        Validator::new(&config).validate(&CampaignStructure { campaigns })
    }

    #[test]
    fn test_valid_campaign_has_no_issues() {
        assert!(validate(vec![sample_campaign()]).is_empty());
    }

    #[test]
    fn test_headline_over_limit_is_warning() {
        let scope = sample_scope();
        let issues = headline(
            "This headline is definitely longer than thirty",
            &scope.field("Headline 1", "headline_1"),
            30,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].field, "campaigns[0].ad_groups[0].ads[0].headline_1");
        assert_eq!(issues[0].row_index, Some(0));
        assert!(issues[0].message.starts_with("Campaign \"Locks\" > Ad Group \"Emergency\" > Ad #1: Headline 1"));
    }

    #[test]
    fn test_headline_macro_text_not_counted() {
        let scope = sample_scope();
        // 33 characters in total, 14 of them literal.
        let text = "{KeyWord:Locksmith} Open 24 Hours";
        assert!(text.chars().count() > 30);
        assert!(headline(text, &scope.field("Headline 1", "headline_1"), 30).is_empty());
    }

    #[test]
    fn test_description_over_limit_is_warning() {
        let scope = sample_scope();
        let long = "x".repeat(91);
        let issues = description(&long, &scope.field("Description 1", "description_1"), 90);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_description_counts_macro_text() {
        let scope = sample_scope();
        let field = scope.field("Description 1", "description_1");
        // A 19-character macro and 83 literal characters.
        let text = format!("{{KeyWord:Locksmith}} {}", "y".repeat(82));
        assert_eq!(text.chars().count(), 102);
        let issues = description(&text, &field, 90);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].message.ends_with("is 102 characters (limit 90)"));

        let headline_field = scope.field("Headline 1", "headline_1");
        assert!(headline(&format!("{{KeyWord:Locksmith}} {}", "y".repeat(10)), &headline_field, 30)
            .is_empty());
    }

    #[test]
    fn test_dki_syntax_errors() {
        let scope = sample_scope();
        let field = scope.field("Headline 1", "headline_1");
        assert_eq!(dki_syntax("{KeyWord:Foo", &field).len(), 1);
        assert_eq!(dki_syntax("{KeyWord:{Foo}}", &field).len(), 1);
        assert_eq!(dki_syntax("{KeyWord:}", &field).len(), 1);
        assert_eq!(dki_syntax("{KeyWord}", &field).len(), 1);
        assert!(dki_syntax("{KeyWord:Locksmith}", &field).is_empty());
        assert!(dki_syntax("{KeyWord:Foo", &field)[0].is_error());
    }

    #[test]
    fn test_unbalanced_headline_yields_single_error() {
        let scope = sample_scope();
        let issues = headline(
            "{KeyWord:Foo and a lot more text past the limit",
            &scope.field("Headline 1", "headline_1"),
            30,
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_url_rules() {
        let scope = sample_scope();
        let field = scope.field("Final URL", "final_url");
        assert!(url("https://example.com/locks", &field, true).is_empty());
        assert_eq!(url("", &field, true).len(), 1);
        assert!(url("", &field, false).is_empty());
        assert!(url("https://Example.com", &field, true)
            .iter()
            .any(|i| i.message.contains("uppercase")));
        assert!(url("https://example.com/a b", &field, true)
            .iter()
            .any(|i| i.message.contains("whitespace")));
        assert!(url("https://example.com/{keyword:x}", &field, true)
            .iter()
            .any(|i| i.message.contains("DKI placeholder")));
        assert!(!url("ftp://example.com", &field, true).is_empty());
        assert!(!url("example.com", &field, true).is_empty());
    }

    #[test]
    fn test_match_type_sets_are_disjoint() {
        let scope = sample_scope();
        let field = scope.field("Keyword #1", "keywords[0]");
        for mt in MatchType::KEYWORD {
            assert!(keyword_match_type(mt, &field).is_empty());
            assert_eq!(negative_match_type(mt, &field).len(), 1);
        }
        for mt in MatchType::NEGATIVE {
            assert_eq!(keyword_match_type(mt, &field).len(), 1);
            assert!(negative_match_type(mt, &field).is_empty());
        }
    }

    #[test]
    fn test_keyword_count_warning() {
        let scope = sample_scope();
        let field = scope.field("Ad group", "keywords");
        assert!(keyword_count(10_000, &field, 10_000).is_empty());
        let issues = keyword_count(10_001, &field, 10_000);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_postal_code_format() {
        assert!(is_valid_postal_code("90210"));
        assert!(is_valid_postal_code("90210-1234"));
        assert!(!is_valid_postal_code("9021"));
        assert!(!is_valid_postal_code("90210-12"));
        assert!(!is_valid_postal_code("ABCDE"));
    }

    #[test]
    fn test_rsa_minimums_warn_and_maximums_error() {
        let mut campaign = sample_campaign();
        let mut rsa = sample_rsa();
        rsa.headlines.truncate(2);
        campaign.ad_groups[0].ads = vec![Ad::ResponsiveSearch(rsa)];
        let issues = validate(vec![campaign.clone()]);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());

        let mut rsa = sample_rsa();
        rsa.headlines = (0..16).map(|i| format!("Headline {i}")).collect();
        campaign.ad_groups[0].ads = vec![Ad::ResponsiveSearch(rsa)];
        let issues = validate(vec![campaign]);
        assert!(issues.iter().any(|i| i.is_error() && i.field.ends_with("headlines")));
    }

    #[test]
    fn test_dki_ad_requires_keyword_macro() {
        let mut campaign = sample_campaign();
        let rsa = sample_rsa();
        campaign.ad_groups[0].ads = vec![Ad::DynamicKeyword(DynamicKeywordAd {
            headlines: rsa.headlines.clone(),
            descriptions: rsa.descriptions.clone(),
            path1: None,
            path2: None,
            final_url: rsa.final_url.clone(),
            final_mobile_url: None,
            status: Default::default(),
        })];
        let errors: Vec<_> = validate(vec![campaign])
            .into_iter()
            .filter(|i| i.is_error())
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("{KeyWord:Default Text}"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut campaign = sample_campaign();
        campaign.ad_groups.push(campaign.ad_groups[0].clone());
        let issues = validate(vec![campaign.clone(), sample_campaign()]);
        let errors: Vec<&str> = issues
            .iter()
            .filter(|i| i.is_error())
            .map(|i| i.field.as_str())
            .collect();
        assert_eq!(errors, vec!["campaigns[0].ad_groups[1].name", "campaigns[1].name"]);
    }

    #[test]
    fn test_campaign_level_rules() {
        let mut campaign = sample_campaign();
        campaign.budget = Some(0.0);
        campaign.start_date = chrono::NaiveDate::from_ymd_opt(2026, 5, 1);
        campaign.end_date = chrono::NaiveDate::from_ymd_opt(2026, 4, 1);
        campaign.negative_keywords = vec![NegativeKeyword::new("free", MatchType::Broad)];
        let fields: Vec<String> = validate(vec![campaign])
            .into_iter()
            .filter(|i| i.is_error())
            .map(|i| i.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                "campaigns[0].budget",
                "campaigns[0].end_date",
                "campaigns[0].negative_keywords[0]",
            ]
        );
    }

    #[test]
    fn test_location_rules() {
        let mut campaign = sample_campaign();
        let mut boosted = LocationTarget::new(LocationTargetType::City, "Austin");
        boosted.bid_adjustment = Some(950.0);
        campaign.locations = vec![
            LocationTarget::new(LocationTargetType::PostalCode, "10001"),
            LocationTarget::new(LocationTargetType::PostalCode, "10001"),
            LocationTarget::new(LocationTargetType::PostalCode, "10001"),
            LocationTarget::new(LocationTargetType::PostalCode, "1000"),
            boosted,
        ];
        let issues = validate(vec![campaign]);
        let warnings: Vec<_> = issues.iter().filter(|i| !i.is_error()).collect();
        let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].row_index, Some(1));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_location_count_thresholds() {
        let config = ExportConfig {
            location_warning_threshold: 2,
            max_location_targets: 4,
            ..ExportConfig::default()
        };
        let validator = Validator::new(&config);
        let mut campaign = sample_campaign();
        campaign.locations = ["10001", "10002", "10003"]
            .iter()
            .map(|z| LocationTarget::new(LocationTargetType::PostalCode, *z))
            .collect();
        let issues = validator.validate(&CampaignStructure {
            campaigns: vec![campaign.clone()],
        });
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());

        campaign.locations = ["10001", "10002", "10003", "10004", "10005"]
            .iter()
            .map(|z| LocationTarget::new(LocationTargetType::PostalCode, *z))
            .collect();
        let issues = validator.validate(&CampaignStructure {
            campaigns: vec![campaign],
        });
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_extension_rules() {
        let mut campaign = sample_campaign();
        campaign.extensions = vec![
            Extension::Sitelink(Sitelink {
                text: "A sitelink text that is far too long".to_string(),
                description1: Some("Short".to_string()),
                description2: None,
                final_url: "https://example.com/contact".to_string(),
            }),
            Extension::Callout(Callout {
                text: "Free Estimates".to_string(),
            }),
            Extension::StructuredSnippet(StructuredSnippet {
                header: "Services".to_string(),
                values: vec!["Rekeying".to_string()],
            }),
            Extension::Call(CallExtension {
                phone_number: String::new(),
                country_code: "US".to_string(),
            }),
        ];
        let issues = validate(vec![campaign]);
        let errors: Vec<&str> = issues
            .iter()
            .filter(|i| i.is_error())
            .map(|i| i.field.as_str())
            .collect();
        assert_eq!(
            errors,
            vec!["campaigns[0].extensions[0].text", "campaigns[0].extensions[3].phone_number"]
        );
        assert_eq!(issues.iter().filter(|i| !i.is_error()).count(), 1);
    }

    #[test]
    fn test_call_only_phone_rules() {
        let scope = sample_scope();
        let field = scope.field("Phone number", "phone_number");
        assert!(phone_number("+1 (555) 010-0000", &field).is_empty());
        assert_eq!(phone_number("call us", &field).len(), 1);
        assert_eq!(phone_number("", &field).len(), 1);
    }
}
