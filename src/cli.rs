use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    ConversionConfig, ConversionSummary, HaploidizeError, InputFormat, OutputFormat, RunReport,
    convert,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Convert diploid genotypes in VCF/BCF files to haploid",
    long_about = None,
    disable_version_flag = true
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Input VCF/BCF file (stdin when omitted or `-`)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Input file format (detected from the stream if not specified)
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    input_format: InputFormat,

    /// Output path (stdout when omitted or `-`)
    #[arg(short = 'o', long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Output file format
    #[arg(short = 'O', long, value_enum, default_value_t = OutputFormat::Vcf)]
    output_format: OutputFormat,

    /// Tab-delimited sex map: sample ID, ploidy code
    #[arg(short = 'm', long, value_name = "FILE", conflicts_with = "all_haploid")]
    sex_map: Option<PathBuf>,

    /// Code used for haploid samples in the sex map
    #[arg(short = 'c', long, default_value = "0")]
    haploid_code: String,

    /// Treat every sample as haploid
    #[arg(long)]
    all_haploid: bool,

    /// Verify genotypes are homozygous before converting
    #[arg(short = 'V', long)]
    verify: bool,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn conversion_config(&self) -> ConversionConfig {
        ConversionConfig {
            input: self.input.clone(),
            input_format: self.input_format,
            output: self.output.clone(),
            output_format: self.output_format,
            sex_map: self.sex_map.clone(),
            haploid_code: self.haploid_code.clone(),
            all_haploid: self.all_haploid,
            verify: self.verify,
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match execute(&cli) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn execute(cli: &Cli) -> Result<ConversionSummary> {
    let config = cli.conversion_config();
    let summary = convert(&config)?;

    if let Some(path) = &cli.report {
        RunReport::new(&config, &summary)
            .write(path)
            .with_context(|| format!("failed to write run report {}", path.display()))?;
    }

    Ok(summary)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<HaploidizeError>()
        .map_or(1, HaploidizeError::exit_code)
}

// Records may go to stdout, so logs always go to stderr.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn print_summary(summary: &ConversionSummary) {
    let total = summary.total_records;
    let emitted = summary.emitted_records;
    let collapsed = summary.collapsed_records;
    let padded = summary.padded_records;
    let passed = summary.passthrough_records;
    tracing::info!(
        "Processed {total} records; wrote {emitted} ({collapsed} collapsed, {padded} padded, {passed} unchanged)."
    );

    let without_gt = summary.records_without_genotypes;
    if without_gt > 0 {
        tracing::info!("Copied {without_gt} records without a GT field unchanged.");
    }

    let unmatched = summary.unmatched_sex_map_ids;
    if unmatched > 0 {
        tracing::warn!("{unmatched} sex map IDs did not match any input sample.");
    }
}
