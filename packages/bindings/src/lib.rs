use napi::Result as NapiResult;
use napi_derive::napi;

use coop_lending_core::amortization::{affordability, schedule, simulation};
use coop_lending_core::catalog::ProductCatalog;
use coop_lending_core::origination::application::LoanApplication;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional catalog document; empty means the built-in products.
fn catalog_from(catalog_json: Option<String>) -> NapiResult<ProductCatalog> {
    match catalog_json {
        Some(json) if !json.trim().is_empty() => {
            ProductCatalog::from_json_str(&json).map_err(to_napi_error)
        }
        _ => Ok(ProductCatalog::default()),
    }
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_loan(input_json: String) -> NapiResult<String> {
    let input: simulation::LoanSimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = simulation::simulate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn assess_affordability(input_json: String) -> NapiResult<String> {
    let input: affordability::AffordabilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = affordability::assess_affordability(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: simulation::LoanSimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = schedule::amortization_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Catalog & applications
// ---------------------------------------------------------------------------

#[napi]
pub fn default_catalog() -> NapiResult<String> {
    serde_json::to_string(&ProductCatalog::default()).map_err(to_napi_error)
}

/// Step errors for a loan application, keyed by field.
#[napi]
pub fn validate_application(
    application_json: String,
    catalog_json: Option<String>,
) -> NapiResult<String> {
    let catalog = catalog_from(catalog_json)?;
    let application: LoanApplication =
        serde_json::from_str(&application_json).map_err(to_napi_error)?;
    let errors = application.validate_all(&catalog);
    serde_json::to_string(&errors).map_err(to_napi_error)
}
