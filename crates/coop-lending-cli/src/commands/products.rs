use serde_json::{json, Value};

use coop_lending_core::catalog::ProductCatalog;

/// One row per product with the figures a member compares.
pub fn run_products(catalog: &ProductCatalog) -> Result<Value, Box<dyn std::error::Error>> {
    let rows: Vec<Value> = catalog
        .products()
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "annual_rate_percent": p.annual_rate_percent.to_string(),
                "min_amount": p.min_amount.to_string(),
                "max_amount": p.max_amount.to_string(),
                "min_term_months": p.min_term_months,
                "max_term_months": p.max_term_months,
                "documents": p.mandatory_documents().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();

    Ok(json!({ "results": rows }))
}
