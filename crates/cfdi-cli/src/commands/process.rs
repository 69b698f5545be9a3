//! Process command - extract the ledger fields from a single invoice file.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use cfdi_core::ledger::COLUMNS;
use cfdi_core::{DocumentExtractor, InvoiceExtractor, InvoiceRecord};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input XML invoice
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print fields that fell back to "Unknown" or zero
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output with the ledger columns
    Csv,
    /// Plain text summary
    Text,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::config::load(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extractor = DocumentExtractor::from_config(&config.extraction);
    let result = extractor.extract(&args.input)?;

    info!(
        "Extracted {} in {}ms",
        args.input.display(),
        result.processing_time_ms
    );

    if args.show_warnings {
        for warning in &result.warnings {
            eprintln!("{} {}", style("⚠").yellow(), warning);
        }
    }

    let output = format_record(&result.record, args.format)?;

    match args.output {
        Some(path) => {
            fs::write(&path, output)?;
            eprintln!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", output),
    }

    Ok(())
}

fn format_record(record: &InvoiceRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_csv(record: &InvoiceRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(COLUMNS)?;
    wtr.write_record([
        record.date.as_str(),
        &record.invoice_number,
        &record.issuer_name,
        &record.tax_id,
        &record.subtotal.to_string(),
        &record.tax_amount.to_string(),
        &record.total.to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data.trim_end().to_string())
}

fn format_text(record: &InvoiceRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", record.invoice_number));
    output.push_str(&format!("Date: {}\n", record.date));
    output.push('\n');

    output.push_str("Issuer:\n");
    output.push_str(&format!("  {}\n", record.issuer_name));
    output.push_str(&format!("  RFC: {}\n", record.tax_id));
    output.push('\n');

    output.push_str("Amounts:\n");
    output.push_str(&format!("  SubTotal: {}\n", record.subtotal));
    output.push_str(&format!("  Tax:      {}\n", record.tax_amount));
    output.push_str(&format!("  Total:    {}", record.total));

    output
}
