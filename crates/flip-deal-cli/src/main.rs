mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::deal::{DealArgs, SensitivityArgs};
use commands::formula::PreviewArgs;
use commands::settings::SettingsCommand;
use commands::variance::VarianceArgs;

/// Fix-and-flip deal calculations
#[derive(Parser)]
#[command(
    name = "flipcalc",
    version,
    about = "Fix-and-flip deal calculations",
    long_about = "Evaluate fix-and-flip deals with decimal precision: maximum allowable \
                  offer, ROI, contingency, holding and selling costs, profit thresholds \
                  and budget variance alerts, all driven by a calculation settings file."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculation details to stderr (same as RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a deal: costs, MAO, ROI, classifications and rehab variance
    Metrics(DealArgs),
    /// Compare the MAO under every method for one deal
    MaoCompare(DealArgs),
    /// Sweep one deal input and report MAO, profit and ROI at each point
    Sensitivity(SensitivityArgs),
    /// Classify the variance between a baseline and a later amount
    Variance(VarianceArgs),
    /// Render a human-readable formula with worked numbers
    Preview(PreviewArgs),
    /// Inspect, validate or update calculation settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Metrics(args) => commands::deal::run_metrics(args),
        Commands::MaoCompare(args) => commands::deal::run_mao_compare(args),
        Commands::Sensitivity(args) => commands::deal::run_sensitivity(args),
        Commands::Variance(args) => commands::variance::run_variance(args),
        Commands::Preview(args) => commands::formula::run_preview(args),
        Commands::Settings(cmd) => commands::settings::run_settings(cmd),
        Commands::Version => {
            println!("flipcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
