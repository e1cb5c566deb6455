//! Loan product catalog.
//!
//! Products carry the rate and the amount / term bounds used to validate an
//! application. The catalog is configuration: it ships with a built-in set
//! and can be replaced by a YAML or JSON file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::{types::*, LendingError, LendingResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_mandatory")]
    pub mandatory: bool,
}

fn default_mandatory() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub id: String,
    pub name: String,
    pub annual_rate_percent: Percent,
    pub min_term_months: Months,
    pub max_term_months: Months,
    pub min_amount: Money,
    pub max_amount: Money,
    /// Eligibility notes shown to the member.
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub required_documents: Vec<RequiredDocument>,
}

impl LoanProduct {
    /// Check an amount and term against the product's bounds. Amount is
    /// checked first.
    pub fn check_bounds(&self, amount: Money, term_months: Months) -> LendingResult<()> {
        if amount < self.min_amount || amount > self.max_amount {
            return Err(LendingError::OutOfBounds {
                field: "amount".into(),
                value: amount,
                min: self.min_amount,
                max: self.max_amount,
            });
        }
        if term_months < self.min_term_months || term_months > self.max_term_months {
            return Err(LendingError::OutOfBounds {
                field: "term_months".into(),
                value: Decimal::from(term_months),
                min: Decimal::from(self.min_term_months),
                max: Decimal::from(self.max_term_months),
            });
        }
        Ok(())
    }

    /// Simulation input at this product's rate, after checking bounds.
    #[cfg(feature = "amortization")]
    pub fn simulation_input(
        &self,
        amount: Money,
        term_months: Months,
    ) -> LendingResult<crate::amortization::simulation::LoanSimulationInput> {
        self.check_bounds(amount, term_months)?;
        Ok(crate::amortization::simulation::LoanSimulationInput::new(
            amount,
            term_months,
            self.annual_rate_percent,
        ))
    }

    #[cfg(feature = "amortization")]
    pub fn simulate(
        &self,
        amount: Money,
        term_months: Months,
    ) -> LendingResult<crate::amortization::simulation::LoanSimulationResult> {
        let input = self.simulation_input(amount, term_months)?;
        crate::amortization::simulation::calculate_simulation(
            input.principal,
            input.term_months,
            input.annual_rate_percent,
        )
    }

    pub fn mandatory_documents(&self) -> impl Iterator<Item = &RequiredDocument> {
        self.required_documents.iter().filter(|d| d.mandatory)
    }

    fn validate(&self) -> LendingResult<()> {
        let field = |name: &str| format!("{}.{}", self.id, name);

        if self.id.trim().is_empty() {
            return Err(LendingError::Config("product id cannot be empty".into()));
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(LendingError::invalid(
                &field("annual_rate_percent"),
                "Rate cannot be negative.",
            ));
        }
        if self.min_amount <= Decimal::ZERO || self.min_term_months == 0 {
            return Err(LendingError::invalid(
                &field("min"),
                "Minimum amount and term must be positive.",
            ));
        }
        if self.min_amount > self.max_amount {
            return Err(LendingError::invalid(
                &field("min_amount"),
                "Minimum amount exceeds maximum amount.",
            ));
        }
        if self.min_term_months > self.max_term_months {
            return Err(LendingError::invalid(
                &field("min_term_months"),
                "Minimum term exceeds maximum term.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalog {
    products: Vec<LoanProduct>,
}

impl ProductCatalog {
    pub fn new(products: Vec<LoanProduct>) -> LendingResult<Self> {
        let catalog = Self { products };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_yaml_str(s: &str) -> LendingResult<Self> {
        let catalog: Self = serde_yaml::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(s: &str) -> LendingResult<Self> {
        let catalog: Self = serde_json::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file. `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> LendingResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| LendingError::Config(format!("failed to read {}: {e}", path.display())))?;

        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        };
        if let Err(ref e) = catalog {
            tracing::warn!(path = %path.display(), error = %e, "failed to load product catalog");
        }
        catalog
    }

    pub fn validate(&self) -> LendingResult<()> {
        if self.products.is_empty() {
            return Err(LendingError::Config(
                "catalog must contain at least one product".into(),
            ));
        }
        let mut seen = HashSet::new();
        for product in &self.products {
            if !seen.insert(product.id.as_str()) {
                return Err(LendingError::Config(format!(
                    "duplicate product id '{}'",
                    product.id
                )));
            }
            product.validate()?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> LendingResult<&LoanProduct> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| LendingError::ProductNotFound(id.to_string()))
    }

    pub fn products(&self) -> &[LoanProduct] {
        &self.products
    }
}

impl Default for ProductCatalog {
    /// The cooperative's standard personal, mortgage and vehicle products.
    fn default() -> Self {
        let base_docs = || {
            vec![
                doc("official-id", "Official identification", "National ID card or passport"),
                doc("proof-of-address", "Proof of address", "Issued within the last 3 months"),
                doc("proof-of-income", "Proof of income", "Last 3 payslips or bank statements"),
            ]
        };

        let mut mortgage_docs = base_docs();
        mortgage_docs.push(doc(
            "property-appraisal",
            "Property appraisal",
            "Certified appraisal no older than 6 months",
        ));
        mortgage_docs.push(doc("deeds", "Deeds", "Copy of the property deeds"));

        let mut vehicle_docs = base_docs();
        vehicle_docs.push(doc(
            "vehicle-invoice",
            "Vehicle invoice",
            "Original invoice or invoice letter",
        ));
        vehicle_docs.push(doc(
            "insurance-policy",
            "Insurance policy",
            "Current vehicle insurance",
        ));

        Self {
            products: vec![
                LoanProduct {
                    id: "personal".into(),
                    name: "Personal loan".into(),
                    annual_rate_percent: dec!(12.5),
                    min_term_months: 6,
                    max_term_months: 60,
                    min_amount: dec!(1_000_000),
                    max_amount: dec!(50_000_000),
                    requirements: vec![
                        "At least 6 months of membership".into(),
                        "Proof of income".into(),
                        "Valid official identification".into(),
                        "Proof of address".into(),
                    ],
                    required_documents: base_docs(),
                },
                LoanProduct {
                    id: "mortgage".into(),
                    name: "Mortgage loan".into(),
                    annual_rate_percent: dec!(9.8),
                    min_term_months: 60,
                    max_term_months: 240,
                    min_amount: dec!(50_000_000),
                    max_amount: dec!(500_000_000),
                    requirements: vec![
                        "At least 1 year of membership".into(),
                        "Property appraisal".into(),
                        "Property deeds".into(),
                        "Proof of income for the last 3 months".into(),
                        "Valid official identification".into(),
                    ],
                    required_documents: mortgage_docs,
                },
                LoanProduct {
                    id: "vehicle".into(),
                    name: "Vehicle loan".into(),
                    annual_rate_percent: dec!(11.2),
                    min_term_months: 12,
                    max_term_months: 72,
                    min_amount: dec!(5_000_000),
                    max_amount: dec!(100_000_000),
                    requirements: vec![
                        "At least 6 months of membership".into(),
                        "Vehicle invoice".into(),
                        "Vehicle insurance".into(),
                        "Proof of income".into(),
                        "Valid official identification".into(),
                    ],
                    required_documents: vehicle_docs,
                },
            ],
        }
    }
}

fn doc(id: &str, name: &str, description: &str) -> RequiredDocument {
    RequiredDocument {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        mandatory: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const YAML_CATALOG: &str = r#"
products:
  - id: education
    name: Education loan
    annual_rate_percent: 8.5
    min_term_months: 6
    max_term_months: 48
    min_amount: 500000
    max_amount: 20000000
    required_documents:
      - id: enrolment
        name: Enrolment certificate
"#;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = ProductCatalog::default();
        catalog.validate().unwrap();
        assert_eq!(catalog.products().len(), 3);
        assert_eq!(catalog.get("mortgage").unwrap().annual_rate_percent, dec!(9.8));
    }

    #[test]
    fn test_document_sets_per_product() {
        let catalog = ProductCatalog::default();
        assert_eq!(catalog.get("personal").unwrap().mandatory_documents().count(), 3);
        assert_eq!(catalog.get("mortgage").unwrap().mandatory_documents().count(), 5);
        assert_eq!(catalog.get("vehicle").unwrap().mandatory_documents().count(), 5);
    }

    #[test]
    fn test_yaml_catalog() {
        let catalog = ProductCatalog::from_yaml_str(YAML_CATALOG).unwrap();
        let product = catalog.get("education").unwrap();
        assert_eq!(product.annual_rate_percent, dec!(8.5));
        assert_eq!(product.max_amount, dec!(20_000_000));
        assert!(product.required_documents[0].mandatory);
        assert!(product.requirements.is_empty());
    }

    #[test]
    fn test_json_catalog_round_trip() {
        let json = serde_json::to_string(&ProductCatalog::default()).unwrap();
        let catalog = ProductCatalog::from_json_str(&json).unwrap();
        assert_eq!(catalog, ProductCatalog::default());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let product = ProductCatalog::default().get("personal").unwrap().clone();
        let err = ProductCatalog::new(vec![product.clone(), product]).unwrap_err();
        assert!(matches!(err, LendingError::Config(_)));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut product = ProductCatalog::default().get("personal").unwrap().clone();
        product.min_term_months = 72;
        assert!(ProductCatalog::new(vec![product]).is_err());
    }

    #[test]
    fn test_unknown_product() {
        let err = ProductCatalog::default().get("boat").unwrap_err();
        assert!(matches!(err, LendingError::ProductNotFound(id) if id == "boat"));
    }

    #[test]
    fn test_bounds_checked_amount_first() {
        let catalog = ProductCatalog::default();
        let personal = catalog.get("personal").unwrap();
        personal.check_bounds(dec!(10_000_000), 24).unwrap();

        match personal.check_bounds(dec!(1), 1).unwrap_err() {
            LendingError::OutOfBounds { field, .. } => assert_eq!(field, "amount"),
            other => panic!("Expected OutOfBounds, got {other:?}"),
        }
        match personal.check_bounds(dec!(10_000_000), 61).unwrap_err() {
            LendingError::OutOfBounds { field, max, .. } => {
                assert_eq!(field, "term_months");
                assert_eq!(max, dec!(60));
            }
            other => panic!("Expected OutOfBounds, got {other:?}"),
        }
    }

    #[cfg(feature = "amortization")]
    #[test]
    fn test_product_simulation_uses_product_rate() {
        let catalog = ProductCatalog::default();
        let result = catalog
            .get("personal")
            .unwrap()
            .simulate(dec!(10_000_000), 24)
            .unwrap();
        assert!((result.monthly_payment - dec!(473_073.08)).abs() < dec!(0.01));
    }
}
