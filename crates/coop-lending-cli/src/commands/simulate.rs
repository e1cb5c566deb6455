use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use coop_lending_core::amortization::{schedule, simulation};
use coop_lending_core::amortization::simulation::LoanSimulationInput;
use coop_lending_core::catalog::ProductCatalog;

use crate::input;

/// Arguments shared by `simulate` and `schedule`
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan product id; takes the rate from the catalog and checks bounds
    #[arg(long)]
    pub product: Option<String>,

    /// Amount borrowed
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months")]
    pub term: Option<u32>,

    /// Nominal annual rate in percent (12.5 = 12.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,
}

pub fn run_simulate(
    args: SimulateArgs,
    catalog: &ProductCatalog,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input = resolve_input(args, catalog)?;
    let output = simulation::simulate(&sim_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_schedule(
    args: SimulateArgs,
    catalog: &ProductCatalog,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input = resolve_input(args, catalog)?;
    let output = schedule::amortization_schedule(&sim_input)?;
    Ok(serde_json::to_value(output)?)
}

/// File, then piped stdin, then flags. With `--product` the rate comes from
/// the catalog and `--rate` is ignored.
pub fn resolve_input(
    args: SimulateArgs,
    catalog: &ProductCatalog,
) -> Result<LoanSimulationInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }

    let principal = args
        .principal
        .ok_or("--principal is required (or provide --input)")?;
    let term = args.term.ok_or("--term is required (or provide --input)")?;

    match args.product {
        Some(ref id) => Ok(catalog.get(id)?.simulation_input(principal, term)?),
        None => Ok(LoanSimulationInput::new(
            principal,
            term,
            args.rate
                .ok_or("--rate is required (or provide --product or --input)")?,
        )),
    }
}
