//! Process command - extract a record from one invoice document set.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use pidoc_core::extract::rules::{format_amount, format_date};
use pidoc_core::models::config::PidocConfig;
use pidoc_core::pipeline::{ExtractionOutcome, ExtractionPipeline};
use pidoc_core::models::record::NormalizedRecord;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Invoice file (PDF, or plain text for pre-extracted input)
    #[arg(required = true)]
    input: PathBuf,

    /// MSDS file contributing the storage condition
    #[arg(long)]
    msds: Option<PathBuf>,

    /// Specification file contributing terms and validity
    #[arg(long)]
    specification: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show candidate scores and the selected strategy
    #[arg(long)]
    show_score: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Record as JSON
    Json,
    /// One CSV row per position
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message("Extracting...");

    let outcome = extract(&args, &config)?;
    pb.finish_with_message("Done");

    for warning in &outcome.report.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }
    if outcome.report.extraction_failed {
        eprintln!(
            "{} Extraction failed; the output is a blank record for manual entry.",
            style("!").yellow()
        );
    }
    if !outcome.record.review_flags.is_empty() {
        eprintln!(
            "{} Fields needing review: {}",
            style("!").yellow(),
            outcome.record.review_flags.join(", ")
        );
    }

    let output = format_record(&outcome.record, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_score {
        let report = &outcome.report;
        println!();
        println!(
            "{} Strategy: {:?} (score {:.3})",
            style("ℹ").blue(),
            report.selected_strategy,
            report.selected_score
        );
        println!(
            "{} Native {:.3} / OCR {:.3}, {} of {} pages via OCR",
            style("ℹ").blue(),
            report.native_score,
            report.ocr_score,
            report.pages_ocrd,
            report.page_count
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PidocConfig> {
    match config_path {
        Some(path) => Ok(PidocConfig::from_file(Path::new(path))?),
        None => Ok(PidocConfig::default()),
    }
}

fn extract(args: &ProcessArgs, config: &PidocConfig) -> anyhow::Result<ExtractionOutcome> {
    let pipeline = ExtractionPipeline::new(config.clone());
    if config.ocr.force_invoice {
        // No OCR engine is wired into the CLI yet; pages resolve from
        // the native text layer only.
        warn!("OCR is configured but no engine is available; using native text layers");
    }

    if is_text_file(&args.input) {
        let invoice = fs::read_to_string(&args.input)?;
        let msds = read_optional_text(args.msds.as_deref())?;
        let specification = read_optional_text(args.specification.as_deref())?;
        Ok(pipeline.run_on_text(&invoice, msds.as_deref(), specification.as_deref()))
    } else {
        let invoice = fs::read(&args.input)?;
        let msds = read_optional(args.msds.as_deref())?;
        let specification = read_optional(args.specification.as_deref())?;
        Ok(pipeline.run(&invoice, msds.as_deref(), specification.as_deref())?)
    }
}

fn is_text_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("text")
    )
}

fn read_optional(path: Option<&Path>) -> anyhow::Result<Option<Vec<u8>>> {
    path.map(fs::read).transpose().map_err(Into::into)
}

fn read_optional_text(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    path.map(fs::read_to_string).transpose().map_err(Into::into)
}

pub fn format_record(record: &NormalizedRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_csv(record: &NormalizedRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "invoice_no",
        "invoice_date",
        "buyer_name",
        "position",
        "code",
        "name_en",
        "quantity",
        "unit",
        "unit_price",
        "total_price",
        "currency",
        "storage_temperature",
    ])?;

    let invoice_date = record.invoice_date.map(format_date).unwrap_or_default();
    for (idx, p) in record.positions.iter().enumerate() {
        wtr.write_record([
            record.invoice_no.as_str(),
            invoice_date.as_str(),
            record.buyer_name.as_str(),
            &(idx + 1).to_string(),
            p.code.as_str(),
            p.name_en.as_str(),
            &p.quantity.map(format_amount).unwrap_or_default(),
            p.unit.as_str(),
            &p.unit_price.map(format_amount).unwrap_or_default(),
            &p.total_price.map(format_amount).unwrap_or_default(),
            p.currency.as_str(),
            &p.effective_temperature(&record.storage_temperature).canonical(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(record: &NormalizedRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", record.invoice_no));
    output.push_str(&format!(
        "Date: {}\n",
        record.invoice_date.map(format_date).unwrap_or_default()
    ));
    output.push('\n');

    output.push_str("Exporter:\n");
    output.push_str(&format!("  {}\n", record.exporter_name));
    if !record.exporter_address.is_empty() {
        output.push_str(&format!("  {}\n", record.exporter_address));
    }
    output.push('\n');

    output.push_str("Buyer:\n");
    output.push_str(&format!("  {}\n", record.buyer_name));
    if !record.buyer_address.is_empty() {
        output.push_str(&format!("  {}\n", record.buyer_address));
    }
    output.push('\n');

    output.push_str("Positions:\n");
    for (idx, p) in record.positions.iter().enumerate() {
        let name = if p.name_en.is_empty() { &p.code } else { &p.name_en };
        output.push_str(&format!(
            "  {}. {} x{} {} @ {} = {} {}\n",
            idx + 1,
            name,
            p.quantity.map(format_amount).unwrap_or_default(),
            p.unit,
            p.unit_price.map(format_amount).unwrap_or_default(),
            p.total_price.map(format_amount).unwrap_or_default(),
            p.currency,
        ));
    }
    output.push('\n');

    output.push_str(&format!(
        "Terms of delivery: {}\n",
        record.terms_of_delivery
    ));
    output.push_str(&format!(
        "Storage: {}\n",
        record.storage_temperature.canonical()
    ));
    if !record.review_flags.is_empty() {
        output.push_str(&format!("Needs review: {}\n", record.review_flags.join(", ")));
    }

    output
}
