use serde::Deserialize;
use std::path::Path;

use crate::error::{ExportError, ExportResult};

/// Root application configuration. Loaded from environment variables
/// with the prefix `ADIOLOGY__` layered over an optional TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Thresholds and output settings for the bulk-CSV exporter. Passed to the
/// exporter explicitly; nothing in the pipeline reads global state.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_headline_max_chars")]
    pub headline_max_chars: usize,
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
    #[serde(default = "default_path_max_chars")]
    pub path_max_chars: usize,
    #[serde(default = "default_keyword_max_chars")]
    pub keyword_max_chars: usize,
    #[serde(default = "default_name_max_chars")]
    pub name_max_chars: usize,
    #[serde(default = "default_sitelink_text_max_chars")]
    pub sitelink_text_max_chars: usize,
    #[serde(default = "default_sitelink_description_max_chars")]
    pub sitelink_description_max_chars: usize,
    #[serde(default = "default_callout_max_chars")]
    pub callout_max_chars: usize,
    #[serde(default = "default_max_keywords_per_ad_group")]
    pub max_keywords_per_ad_group: usize,
    #[serde(default = "default_location_warning_threshold")]
    pub location_warning_threshold: usize,
    #[serde(default = "default_max_location_targets")]
    pub max_location_targets: usize,
    /// Prefix the file with a UTF-8 byte-order mark.
    #[serde(default = "default_include_bom")]
    pub include_bom: bool,
    #[serde(default = "default_generator_name")]
    pub generator_name: String,
    #[serde(default = "default_generator_version")]
    pub generator_version: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Fail normalization on keys the exporter does not understand.
    #[serde(default)]
    pub reject_unknown_fields: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

// Default functions
fn default_headline_max_chars() -> usize {
    30
}
fn default_description_max_chars() -> usize {
    90
}
fn default_path_max_chars() -> usize {
    15
}
fn default_keyword_max_chars() -> usize {
    80
}
fn default_name_max_chars() -> usize {
    255
}
fn default_sitelink_text_max_chars() -> usize {
    25
}
fn default_sitelink_description_max_chars() -> usize {
    35
}
fn default_callout_max_chars() -> usize {
    25
}
fn default_max_keywords_per_ad_group() -> usize {
    10_000
}
fn default_location_warning_threshold() -> usize {
    5_000
}
fn default_max_location_targets() -> usize {
    25_000
}
fn default_include_bom() -> bool {
    true
}
fn default_generator_name() -> String {
    "Adiology Campaign Dashboard".to_string()
}
fn default_generator_version() -> String {
    "CSV Generator V3".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_log_filter() -> String {
    "adiology_export=info,adiology_csv_export=info".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            headline_max_chars: default_headline_max_chars(),
            description_max_chars: default_description_max_chars(),
            path_max_chars: default_path_max_chars(),
            keyword_max_chars: default_keyword_max_chars(),
            name_max_chars: default_name_max_chars(),
            sitelink_text_max_chars: default_sitelink_text_max_chars(),
            sitelink_description_max_chars: default_sitelink_description_max_chars(),
            callout_max_chars: default_callout_max_chars(),
            max_keywords_per_ad_group: default_max_keywords_per_ad_group(),
            location_warning_threshold: default_location_warning_threshold(),
            max_location_targets: default_max_location_targets(),
            include_bom: default_include_bom(),
            generator_name: default_generator_name(),
            generator_version: default_generator_version(),
            default_language: default_language(),
            reject_unknown_fields: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl ExportConfig {
    /// Rejects thresholds the validators cannot work with.
    pub fn validate(&self) -> ExportResult<()> {
        let limits = [
            ("headline_max_chars", self.headline_max_chars),
            ("description_max_chars", self.description_max_chars),
            ("path_max_chars", self.path_max_chars),
            ("keyword_max_chars", self.keyword_max_chars),
            ("name_max_chars", self.name_max_chars),
            ("sitelink_text_max_chars", self.sitelink_text_max_chars),
            ("sitelink_description_max_chars", self.sitelink_description_max_chars),
            ("callout_max_chars", self.callout_max_chars),
            ("max_keywords_per_ad_group", self.max_keywords_per_ad_group),
            ("max_location_targets", self.max_location_targets),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ExportError::Config(format!("{name} must be greater than 0")));
        }
        if self.location_warning_threshold > self.max_location_targets {
            return Err(ExportError::Config(format!(
                "location_warning_threshold ({}) exceeds max_location_targets ({})",
                self.location_warning_threshold, self.max_location_targets
            )));
        }
        if self.generator_name.trim().is_empty() {
            return Err(ExportError::Config("generator_name must not be empty".to_string()));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, then environment
    /// variables (which win).
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("ADIOLOGY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
