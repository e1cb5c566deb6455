mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::affordability::AffordabilityArgs;
use commands::application::ApplyArgs;
use commands::simulate::SimulateArgs;

/// Loan simulation and origination checks for a lending cooperative
#[derive(Parser)]
#[command(
    name = "coop",
    version,
    about = "Loan simulation and origination checks for a lending cooperative",
    long_about = "Simulate fixed-installment loans, build amortisation schedules, \
                  test member affordability against the debt-to-income guideline \
                  and validate loan applications against the product catalog."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Product catalog file (YAML, or JSON with a .json extension)
    #[arg(long, global = true)]
    catalog: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the monthly installment and totals of a loan
    Simulate(SimulateArgs),
    /// Month-by-month amortisation schedule
    Schedule(SimulateArgs),
    /// Payment-to-income affordability check
    Affordability(AffordabilityArgs),
    /// List the loan products in the catalog
    Products,
    /// Validate a loan application and show its simulation
    Apply(ApplyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_default();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let catalog = || config::load_catalog(cli.catalog.as_deref());

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => {
            catalog().and_then(|c| commands::simulate::run_simulate(args, &c))
        }
        Commands::Schedule(args) => {
            catalog().and_then(|c| commands::simulate::run_schedule(args, &c))
        }
        Commands::Affordability(args) => {
            catalog().and_then(|c| commands::affordability::run_affordability(args, &c))
        }
        Commands::Products => catalog().and_then(|c| commands::products::run_products(&c)),
        Commands::Apply(args) => {
            catalog().and_then(|c| commands::application::run_apply(args, &c))
        }
        Commands::Version => {
            println!("coop {}", env!("CARGO_PKG_VERSION"));
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
