use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use coop_lending_core::amortization::affordability::{self, AffordabilityInput};
use coop_lending_core::catalog::ProductCatalog;

use crate::input;

/// Arguments for the affordability check
#[derive(Args)]
pub struct AffordabilityArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Monthly expenses
    #[arg(long, default_value = "0")]
    pub expenses: Decimal,

    /// Monthly installment; computed from --product, --principal and --term when omitted
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Loan product id used to price the installment
    #[arg(long)]
    pub product: Option<String>,

    /// Amount borrowed
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months")]
    pub term: Option<u32>,
}

pub fn run_affordability(
    args: AffordabilityArgs,
    catalog: &ProductCatalog,
) -> Result<Value, Box<dyn std::error::Error>> {
    let aff_input: AffordabilityInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let monthly_payment = match args.payment {
            Some(payment) => payment,
            None => {
                let product = args
                    .product
                    .as_deref()
                    .ok_or("--payment is required (or provide --product, --principal and --term)")?;
                let principal = args.principal.ok_or("--principal is required with --product")?;
                let term = args.term.ok_or("--term is required with --product")?;
                catalog.get(product)?.simulate(principal, term)?.monthly_payment
            }
        };
        AffordabilityInput {
            monthly_income: args
                .income
                .ok_or("--income is required (or provide --input)")?,
            monthly_expenses: args.expenses,
            monthly_payment,
        }
    };

    let output = affordability::assess_affordability(&aff_input)?;
    Ok(serde_json::to_value(output)?)
}
