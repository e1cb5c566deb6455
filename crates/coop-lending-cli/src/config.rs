use coop_lending_core::catalog::ProductCatalog;

/// Catalog from `--catalog`, or the built-in products when no file is given.
pub fn load_catalog(path: Option<&str>) -> Result<ProductCatalog, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let catalog = ProductCatalog::load(path)?;
            tracing::info!(path, products = catalog.products().len(), "product catalog loaded");
            Ok(catalog)
        }
        None => {
            tracing::debug!("using built-in product catalog");
            Ok(ProductCatalog::default())
        }
    }
}
