//! Process command - parse, reconcile and export a single receipt.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use grocer_core::models::config::ExportFormat;
use grocer_core::{
    load_receipt, CsvSink, GrocerConfig, JsonSink, Report, ReportSink, RowSink, Vendor,
};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Receipt file (Sainsbury's PDF or Waitrose .eml)
    #[arg(required = true)]
    input: PathBuf,

    /// Vendor (default: guessed from the file extension)
    #[arg(long, value_enum)]
    vendor: Option<VendorArg>,

    /// Output format (default: from config, else csv)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum VendorArg {
    /// Sainsbury's PDF order confirmation
    Sainsburys,
    /// Waitrose order confirmation email
    Waitrose,
}

impl From<VendorArg> for Vendor {
    fn from(arg: VendorArg) -> Self {
        match arg {
            VendorArg::Sainsburys => Vendor::Sainsburys,
            VendorArg::Waitrose => Vendor::Waitrose,
        }
    }
}

/// Command-line twin of [`ExportFormat`], which stays free of clap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Shared cost row, header, one row per unit
    Csv,
    /// JSON with unit items and the shared cost
    Json,
    /// Plain text summary
    Text,
    /// Spreadsheet rows as JSON arrays
    Rows,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Text => ExportFormat::Text,
            OutputFormat::Rows => ExportFormat::Rows,
        }
    }
}

impl From<ExportFormat> for OutputFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Csv => OutputFormat::Csv,
            ExportFormat::Json => OutputFormat::Json,
            ExportFormat::Text => OutputFormat::Text,
            ExportFormat::Rows => OutputFormat::Rows,
        }
    }
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let vendor = match args.vendor {
        Some(vendor) => vendor.into(),
        None => Vendor::from_path(&args.input)
            .or(config.parsing.default_vendor)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Cannot tell the vendor of {}. Use --vendor sainsburys|waitrose.",
                    args.input.display()
                )
            })?,
    };

    info!("Processing {} receipt: {}", vendor.name(), args.input.display());

    let report = load_receipt(&args.input, vendor, config.pdf.min_text_length)?;

    let format = args.format.map(ExportFormat::from).unwrap_or(config.export.format);
    let output = format_report(&report, format, &config)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    debug!("Processed in {}ms", start.elapsed().as_millis());

    Ok(())
}

fn format_report(report: &Report, format: ExportFormat, config: &GrocerConfig) -> anyhow::Result<String> {
    match format {
        ExportFormat::Csv => {
            let mut sink = CsvSink::with_config(Vec::new(), &config.export);
            sink.write_report(report)?;
            Ok(String::from_utf8(sink.into_inner()?)?)
        }
        ExportFormat::Json => {
            let mut sink = JsonSink::new(Vec::new());
            sink.write_report(report)?;
            Ok(String::from_utf8(sink.into_inner())?)
        }
        ExportFormat::Rows => {
            let mut sink = RowSink::new();
            sink.write_report(report)?;
            let mut output = serde_json::to_string_pretty(sink.rows())?;
            output.push('\n');
            Ok(output)
        }
        ExportFormat::Text => format_text(report),
    }
}

fn format_text(report: &Report) -> anyhow::Result<String> {
    let mut output = String::new();

    output.push_str("Items:\n");
    for item in report.items() {
        output.push_str(&format!(
            "  {:>3} x {:<40} {:>10}",
            item.qty,
            item.name,
            item.price()?.to_string()
        ));
        if !item.discount.is_zero() {
            output.push_str(&format!("  (discount {})", item.discount));
        }
        output.push('\n');
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Units:        {}\n", report.total_item_qty()));
    output.push_str(&format!("  Items:        {}\n", report.total_item_price()?));
    output.push_str(&format!("  Discounts:    {}\n", report.total_item_discounts()?));
    output.push_str(&format!("  Shared cost:  {}\n", report.shared_cost()));
    output.push_str(&format!("  Total:        {}\n", report.total_price()?));

    Ok(output)
}
