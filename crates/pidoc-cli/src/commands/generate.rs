//! Generate command - render output documents from an extracted record.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use pidoc_core::models::record::NormalizedRecord;
use pidoc_core::extract::group_by_temperature;
use pidoc_core::render::{Rendered, render_label, render_price_list};

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Extracted record (JSON, as produced by `pidoc process`)
    #[arg(required = true)]
    record: PathBuf,

    /// Price-list template with {{PLACEHOLDER}} keys
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Transport-label template
    #[arg(long)]
    label_template: Option<PathBuf>,

    /// Skip the transport labels
    #[arg(long)]
    no_labels: bool,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

pub async fn run(args: GenerateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::process::load_config(config_path)?;
    let record: NormalizedRecord = serde_json::from_str(&fs::read_to_string(&args.record)?)?;
    if record.is_blank() {
        anyhow::bail!("Record is blank; fill it in before generating documents.");
    }
    if !record.review_flags.is_empty() {
        eprintln!(
            "{} Record has unreviewed fields: {}",
            style("!").yellow(),
            record.review_flags.join(", ")
        );
    }

    fs::create_dir_all(&args.output_dir)?;

    // CLI flags win over config-declared template paths.
    let template_path = args
        .template
        .clone()
        .or_else(|| config.template.price_list.clone());
    let template = template_path
        .as_deref()
        .map(fs::read_to_string)
        .transpose()?;
    let price_list = render_price_list(&record, template.as_deref());
    if template.is_some() {
        note_fallback(&price_list, "price list");
    }

    let target = args.output_dir.join("price_list.txt");
    fs::write(&target, price_list.text())?;
    println!("{} Wrote {}", style("✓").green(), target.display());

    if !args.no_labels {
        let label_path = args
            .label_template
            .clone()
            .or_else(|| config.template.label.clone());
        let label_template = label_path
            .as_deref()
            .map(fs::read_to_string)
            .transpose()?;
        let groups = group_by_temperature(&record);
        info!("{} temperature groups", groups.len());

        for (idx, group) in groups.iter().enumerate() {
            let label = render_label(&record, group, label_template.as_deref());
            if label_template.is_some() {
                note_fallback(&label, "label");
            }

            let target = args.output_dir.join(format!("label_{}.txt", idx + 1));
            fs::write(&target, label.text())?;
            println!(
                "{} Wrote {} ({})",
                style("✓").green(),
                target.display(),
                group.temperature.canonical()
            );
        }
    }

    Ok(())
}

fn note_fallback(rendered: &Rendered, what: &str) {
    if rendered.is_fallback() {
        eprintln!(
            "{} Template did not apply for the {}; built-in layout used.",
            style("!").yellow(),
            what
        );
    }
}
