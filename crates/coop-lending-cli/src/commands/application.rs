use clap::Args;
use serde_json::{json, Value};

use coop_lending_core::catalog::ProductCatalog;
use coop_lending_core::origination::application::LoanApplication;

use crate::input;

/// Arguments for validating a loan application
#[derive(Args)]
pub struct ApplyArgs {
    /// Path to a JSON or YAML loan application (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Check every step of an application and show what the member would see:
/// the simulation, the affordability result and any outstanding errors.
pub fn run_apply(args: ApplyArgs, catalog: &ProductCatalog) -> Result<Value, Box<dyn std::error::Error>> {
    let application: LoanApplication = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe an application on stdin)".into());
    };

    let errors = application.validate_all(catalog);
    let simulation = application.simulation(catalog).ok();
    let affordability = application.affordability(catalog).ok();

    let mut warnings: Vec<String> = Vec::new();
    if let Some(ref a) = affordability {
        if !a.within_guideline {
            warnings.push(
                "Installment is above 40% of income; consider a smaller amount or a longer term."
                    .into(),
            );
        }
    }

    Ok(json!({
        "result": {
            "member_id": application.member_id,
            "product_id": application.product_id,
            "step": application.step,
            "ready_to_submit": errors.is_empty(),
            "errors": errors,
            "simulation": simulation,
            "affordability": affordability,
        },
        "methodology": "Loan application step validation",
        "warnings": warnings,
    }))
}
