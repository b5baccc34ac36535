//! Adiology Export CLI: turn campaign JSON into a Google Ads Editor bulk CSV,
//! validate campaign JSON, or synthesize a postal-code campaign.

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use adiology_core::AppConfig;
use adiology_csv_export::issue::render_issues;
use adiology_csv_export::{
    CsvExport, CsvExporter, ExportOutcome, RejectionStage, ValidationReport,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Lowest and highest assigned US ZIP codes used by `zip-campaign`.
const ZIP_MIN: u32 = 501;
const ZIP_MAX: u32 = 99_950;

#[derive(Parser)]
#[command(name = "adiology-export")]
#[command(about = "Google Ads Editor bulk-CSV exporter for Adiology campaigns")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true, env = "ADIOLOGY_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (default: from config)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Omit the UTF-8 byte-order mark from the CSV
    #[arg(long, global = true, default_value_t = false)]
    no_bom: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a campaign structure to CSV
    Export {
        /// Campaign JSON file, or `-` for stdin
        #[arg(short, long)]
        input: String,

        /// CSV output file, or `-` for stdout (default: derived from the campaign name)
        #[arg(short, long)]
        output: Option<String>,

        /// Also write the issue report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Normalize and validate a campaign structure without exporting
    Validate {
        /// Campaign JSON file, or `-` for stdin
        #[arg(short, long)]
        input: String,
    },

    /// Generate a campaign targeting N random US ZIP codes and export it
    ZipCampaign {
        /// Number of distinct ZIP codes
        #[arg(short, long, default_value = "10000")]
        count: usize,

        /// Campaign name (default: "Zip Code Campaign - <count> Locations")
        #[arg(short, long)]
        name: Option<String>,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// CSV output file, or `-` for stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = AppConfig::load_from(cli.config.as_deref());
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => AppConfig::default(),
    };

    let json_logs = match cli.log_format {
        Some(LogFormat::Json) => true,
        Some(LogFormat::Pretty) => false,
        None => config.logging.json,
    };
    init_tracing(&config.logging.filter, json_logs);

    if let Err(e) = &loaded {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    if cli.no_bom {
        config.export.include_bom = false;
    }
    config
        .export
        .validate()
        .context("invalid export configuration")?;

    let exporter = CsvExporter::new(config.export);

    match cli.command {
        Commands::Export {
            input,
            output,
            report,
        } => cmd_export(&exporter, &input, output, report),
        Commands::Validate { input } => cmd_validate(&exporter, &input),
        Commands::ZipCampaign {
            count,
            name,
            seed,
            output,
        } => cmd_zip_campaign(&exporter, count, name, seed, output),
    }
}

/// Logs always go to stderr so the CSV can be streamed to stdout.
fn init_tracing(default_filter: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_export(
    exporter: &CsvExporter,
    input: &str,
    output: Option<String>,
    report: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let raw = read_input(input)?;
    let outcome = exporter
        .export_json(&raw)
        .with_context(|| format!("failed to export campaign JSON from {input}"))?;

    match outcome {
        ExportOutcome::Csv(export) => {
            if let Some(path) = &report {
                let warnings =
                    ValidationReport::new(RejectionStage::Validation, export.warnings.clone());
                write_report(path, &warnings)?;
            }
            finish_export(&export, output)?;
            Ok(ExitCode::SUCCESS)
        }
        ExportOutcome::Rejected(rejection) => {
            if let Some(path) = &report {
                write_report(path, &rejection)?;
            }
            eprintln!("{}", rejection.render());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_validate(exporter: &CsvExporter, input: &str) -> anyhow::Result<ExitCode> {
    let raw = read_input(input)?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse campaign JSON from {input}"))?;
    let report = exporter.validate(&value);

    if report.issues.is_empty() {
        println!("No issues found.");
    } else {
        println!("{}", report.render());
    }
    info!(
        stage = ?report.stage,
        errors = report.error_count,
        warnings = report.warning_count,
        "validation finished"
    );

    Ok(if report.error_count > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_zip_campaign(
    exporter: &CsvExporter,
    count: usize,
    name: Option<String>,
    seed: Option<u64>,
    output: Option<String>,
) -> anyhow::Result<ExitCode> {
    let available = (ZIP_MAX - ZIP_MIN + 1) as usize;
    if count == 0 || count > available {
        bail!("--count must be between 1 and {available}");
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let zips = random_zip_codes(&mut rng, count);
    let name = name.unwrap_or_else(|| format!("Zip Code Campaign - {count} Locations"));
    info!(campaign = %name, zip_codes = zips.len(), "generated postal-code campaign");

    let outcome = exporter
        .export(&zip_campaign(&name, &zips))
        .context("failed to write CSV")?;
    match outcome {
        ExportOutcome::Csv(export) => {
            finish_export(&export, output)?;
            Ok(ExitCode::SUCCESS)
        }
        ExportOutcome::Rejected(rejection) => {
            eprintln!("{}", rejection.render());
            Ok(ExitCode::FAILURE)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read campaign JSON from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
    }
}

/// Writes the CSV, then prints any warnings to stderr.
fn finish_export(export: &CsvExport, output: Option<String>) -> anyhow::Result<()> {
    match output.as_deref() {
        Some("-") => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(export.content.as_bytes())
                .context("failed to write CSV to stdout")?;
            stdout.flush()?;
        }
        other => {
            let path = Path::new(other.unwrap_or(export.filename.as_str()));
            export
                .write_to(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("CSV written to: {}", path.display());
        }
    }

    let counts = &export.row_counts;
    eprintln!(
        "Exported {} campaign(s), {} ad group(s), {} keyword(s), {} ad(s), {} location(s)",
        counts.campaigns, counts.ad_groups, counts.keywords, counts.ads, counts.locations
    );
    if !export.warnings.is_empty() {
        eprintln!("{}", render_issues(&export.warnings));
    }
    Ok(())
}

fn write_report(path: &Path, report: &ValidationReport) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

/// `count` distinct five-digit ZIP codes, sorted ascending.
fn random_zip_codes(rng: &mut impl Rng, count: usize) -> Vec<String> {
    let mut zips = BTreeSet::new();
    while zips.len() < count {
        zips.insert(rng.gen_range(ZIP_MIN..=ZIP_MAX));
    }
    zips.into_iter().map(|zip| format!("{zip:05}")).collect()
}

fn zip_campaign(name: &str, zips: &[String]) -> Value {
    json!({
        "campaign_name": name,
        "budget": 100,
        "bidding_strategy": "Maximize Clicks",
        "zip_codes": zips,
        "ad_groups": [{
            "adgroup_name": "All Locations",
            "match_types": ["broad", "phrase", "exact"],
            "keywords": ["local services", "services near me"],
            "ads": [{
                "type": "rsa",
                "headlines": ["Local Services Near You", "Fast Reliable Service", "Call Today"],
                "descriptions": [
                    "Trusted local professionals serving your area.",
                    "Get a free quote today."
                ],
                "final_url": "https://www.example.com"
            }]
        }]
    })
}
