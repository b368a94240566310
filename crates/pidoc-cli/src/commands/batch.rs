//! Batch processing command for directories of invoice sets.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error};

use pidoc_core::models::record::Strategy;
use pidoc_core::pipeline::{ExtractionOutcome, ExtractionPipeline};

use super::process::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file records
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: Option<ExtractionOutcome>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let pipeline = ExtractionPipeline::new(config);
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_one(&pipeline, &path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(outcome) => {
                if let Some(ref output_dir) = args.output_dir {
                    let name = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("record");
                    let target = output_dir.join(format!("{}.json", name));
                    fs::write(&target, serde_json::to_string_pretty(&outcome.record)?)?;
                    debug!("wrote {}", target.display());
                }
                results.push(ProcessResult {
                    path,
                    outcome: Some(outcome),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                if !args.continue_on_error {
                    pb.abandon();
                    return Err(e);
                }
                results.push(ProcessResult {
                    path,
                    outcome: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                });
            }
        }
        pb.inc(1);
    }
    pb.finish();

    let succeeded = results.iter().filter(|r| r.outcome.is_some()).count();
    let failed = results.len() - succeeded;
    println!(
        "{} Processed {} files in {:.1}s ({} ok, {} failed)",
        style("✓").green(),
        results.len(),
        start.elapsed().as_secs_f64(),
        succeeded,
        failed
    );

    if args.summary {
        let summary = summary_csv(&results)?;
        match args.output_dir {
            Some(ref output_dir) => {
                let target = output_dir.join("summary.csv");
                fs::write(&target, summary)?;
                println!("{} Summary written to {}", style("✓").green(), target.display());
            }
            None => print!("{}", summary),
        }
    }

    Ok(())
}

fn process_one(pipeline: &ExtractionPipeline<'_>, path: &PathBuf) -> anyhow::Result<ExtractionOutcome> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case("txt") {
        let text = fs::read_to_string(path)?;
        Ok(pipeline.run_on_text(&text, None, None))
    } else {
        let data = fs::read(path)?;
        Ok(pipeline.run(&data, None, None)?)
    }
}

fn summary_csv(results: &[ProcessResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "file",
        "status",
        "invoice_no",
        "positions",
        "strategy",
        "score",
        "time_ms",
        "error",
    ])?;

    for result in results {
        let (status, invoice_no, positions, strategy, score) = match &result.outcome {
            Some(outcome) if !outcome.report.extraction_failed => (
                "ok",
                outcome.record.invoice_no.clone(),
                outcome.record.positions.len().to_string(),
                strategy_name(outcome.report.selected_strategy),
                format!("{:.3}", outcome.report.selected_score),
            ),
            Some(_) => ("blank", String::new(), "0".to_string(), "", String::new()),
            None => ("error", String::new(), String::new(), "", String::new()),
        };
        wtr.write_record([
            &result.path.display().to_string(),
            status,
            &invoice_no,
            &positions,
            strategy,
            &score,
            &result.processing_time_ms.to_string(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn strategy_name(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Native => "native",
        Strategy::Ocr => "ocr",
    }
}
