mod commands;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;

use commands::offers::{AffordabilityArgs, AnalyzeArgs, CompareArgs};
use commands::payment::PaymentArgs;

/// Mortgage offer analytics: scoring, stress tests and comparison
#[derive(Parser)]
#[command(
    name = "moa",
    version,
    about = "Mortgage offer analytics: scoring, stress tests and comparison",
    long_about = "A CLI for analysing a borrower's mortgage offers with decimal precision. \
                  Computes cost and rate analytics, an affordability stress test, a 0-100 \
                  suitability score, narrative pros and cons, and cross-offer comparisons."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Affordability assumptions file (YAML or JSON)
    #[arg(long, global = true)]
    assumptions: Option<String>,

    /// Log engine activity to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse an offer set: analytics, scores, narrative, comparison, summary
    Analyze(AnalyzeArgs),
    /// Compare 2-5 offers factor by factor
    Compare(CompareArgs),
    /// Stress test a single offer
    Affordability(AffordabilityArgs),
    /// Level monthly payment for a repayment mortgage
    Payment(PaymentArgs),
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

    if let Err(e) = telemetry::init(cli.verbose) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    let result = run(&cli);

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

fn run(cli: &Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let assumptions = match cli.assumptions {
        Some(ref path) => {
            debug!(path = %path, "loading affordability assumptions");
            Some(input::file::read_document(path)?)
        }
        None => None,
    };

    match cli.command {
        Commands::Analyze(ref args) => commands::offers::run_analyze(args, assumptions),
        Commands::Compare(ref args) => commands::offers::run_compare(args, assumptions),
        Commands::Affordability(ref args) => {
            commands::offers::run_affordability(args, assumptions)
        }
        Commands::Payment(ref args) => commands::payment::run_payment(args),
        Commands::Version => {
            println!("moa {}", env!("CARGO_PKG_VERSION"));
            process::exit(0);
        }
    }
}
