//! Brinson CLI binary.
//!
//! Runs Brinson attribution with Carino linking over wide CSV tables.

mod integration;

use brinson::{AttributionEngine, AttributionSummary, AttributionWorkbook, ExportFormat, Exporter};
use clap::{Args, Parser, Subcommand, ValueEnum};
use integration::CliError;
use integration::inputs::{InputPaths, describe};
use integration::settings::ConfigSources;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "brinson")]
#[command(about = "Brinson performance attribution with Carino linking", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Directory holding portfolio_weights.csv, portfolio_returns.csv,
    /// benchmark_weights.csv, benchmark_returns.csv and optionally
    /// multi_industry.csv
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Portfolio instrument weights
    #[arg(long)]
    portfolio_weights: Option<PathBuf>,

    /// Portfolio instrument returns
    #[arg(long)]
    portfolio_returns: Option<PathBuf>,

    /// Benchmark sector weights
    #[arg(long)]
    benchmark_weights: Option<PathBuf>,

    /// Benchmark sector returns
    #[arg(long)]
    benchmark_returns: Option<PathBuf>,

    /// Multi-industry split matrix
    #[arg(long)]
    multi_industry: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Effect model (brinson_fachler or folded_interaction)
    #[arg(long)]
    effect_model: Option<String>,

    /// Portfolio weight lag (same_day or previous_period)
    #[arg(long)]
    portfolio_lag: Option<String>,

    /// Benchmark weight lag (same_day or previous_period)
    #[arg(long)]
    benchmark_lag: Option<String>,
}

impl InputArgs {
    fn paths(&self) -> InputPaths {
        InputPaths {
            input_dir: self.input_dir.clone(),
            portfolio_weights: self.portfolio_weights.clone(),
            portfolio_returns: self.portfolio_returns.clone(),
            benchmark_weights: self.benchmark_weights.clone(),
            benchmark_returns: self.benchmark_returns.clone(),
            multi_industry: self.multi_industry.clone(),
        }
    }

    fn sources(&self) -> ConfigSources {
        ConfigSources {
            config: self.config.clone(),
            effect_model: self.effect_model.clone(),
            portfolio_lag: self.portfolio_lag.clone(),
            benchmark_lag: self.benchmark_lag.clone(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SummaryStyle {
    Ascii,
    Markdown,
    Json,
    Quiet,
}

#[derive(Subcommand)]
enum Commands {
    /// Run attribution and write every result sheet
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        /// Directory the sheets are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Sheet format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// How the summary is printed
        #[arg(long, value_enum, default_value = "ascii")]
        summary: SummaryStyle,

        /// Portfolio name shown in the summary
        #[arg(long, default_value = "Portfolio")]
        name: String,
    },

    /// Check that the input tables load and normalize
    Validate {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        tracing::error!(error = %e, "brinson failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run {
            inputs,
            output_dir,
            format,
            summary,
            name,
        } => run_attribution(&inputs, output_dir, &format, summary, name),
        Commands::Validate { inputs } => validate_inputs(&inputs),
    }
}

fn run_attribution(
    args: &InputArgs,
    output_dir: Option<PathBuf>,
    format: &str,
    style: SummaryStyle,
    name: String,
) -> Result<(), CliError> {
    let format = format.parse::<ExportFormat>()?;
    let engine = AttributionEngine::new(args.sources().resolve()?)?;
    let inputs = args.paths().load()?;

    let result = engine.run(&inputs)?;

    if result.identity_violations > 0 {
        tracing::warn!(
            dates = result.identity_violations,
            "Effects do not reproduce the excess return on some dates"
        );
    }

    if let Some(dir) = output_dir {
        let written = AttributionWorkbook::new(&result).write_to_dir(&dir, format)?;
        for path in &written {
            tracing::debug!(path = %path.display(), "Sheet written");
        }
    }

    let summary = AttributionSummary::from_result(name, &result)?;
    match style {
        SummaryStyle::Ascii => println!("{}", summary.to_ascii_table()),
        SummaryStyle::Markdown => println!("{}", summary.to_markdown()),
        SummaryStyle::Json => println!("{}", summary.export_to_string(ExportFormat::PrettyJson)?),
        SummaryStyle::Quiet => {}
    }

    Ok(())
}

fn validate_inputs(args: &InputArgs) -> Result<(), CliError> {
    let engine = AttributionEngine::new(args.sources().resolve()?)?;
    let inputs = args.paths().load()?;
    let frames = engine.normalize(&inputs)?;

    println!("{:<20} {:>8} {:>8}  {:<10}  {:<10}", "Table", "Rows", "Dates", "First", "Last");
    println!("{}", "-".repeat(62));
    for report in describe(&frames)? {
        let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
        println!(
            "{:<20} {:>8} {:>8}  {:<10}  {:<10}",
            report.table.to_string(),
            report.rows,
            report.dates,
            date(report.first_date),
            date(report.last_date)
        );
    }

    if inputs.multi_industry().is_some() {
        println!("\nMulti-industry split applied.");
    }
    tracing::info!("Input tables are valid");

    Ok(())
}
