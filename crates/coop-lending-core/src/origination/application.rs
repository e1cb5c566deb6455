//! Member-side loan request.
//!
//! The request is filled in over five steps. Each step has its own checks,
//! and the request only moves forward when the current step passes. The
//! simulation and the affordability figures are recomputed from the current
//! fields whenever they are asked for, and nothing is stored until
//! [`LoanApplication::submit`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::loans::{LoanRecord, LoanRecordStore, LoanStatus, NewLoanRecord};
use super::members::MemberId;
use crate::amortization::affordability::{calculate_affordability, AffordabilityAssessment};
use crate::amortization::simulation::LoanSimulationResult;
use crate::catalog::{LoanProduct, ProductCatalog};
use crate::error::ValidationErrors;
use crate::{types::*, LendingError, LendingResult};

/// A member's purpose statement must be longer than this.
const MIN_PURPOSE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStep {
    #[default]
    ProductSelection,
    Amount,
    Capacity,
    Documents,
    Confirmation,
}

impl ApplicationStep {
    pub const ALL: [ApplicationStep; 5] = [
        ApplicationStep::ProductSelection,
        ApplicationStep::Amount,
        ApplicationStep::Capacity,
        ApplicationStep::Documents,
        ApplicationStep::Confirmation,
    ];

    pub fn next(self) -> Option<ApplicationStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<ApplicationStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// 1-based position, as shown on the progress bar.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub member_id: MemberId,
    #[serde(default)]
    pub step: ApplicationStep,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub term_months: Option<Months>,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub monthly_income: Option<Money>,
    #[serde(default)]
    pub monthly_expenses: Option<Money>,
    /// Ids of the documents the member has attached.
    #[serde(default)]
    pub attached_documents: BTreeSet<String>,
    #[serde(default)]
    pub accepts_terms: bool,
}

impl LoanApplication {
    pub fn new(member_id: MemberId) -> Self {
        Self {
            member_id,
            ..Self::default()
        }
    }

    /// Pick a product. Attachments belong to a product's document list, so
    /// they are cleared when the product changes.
    pub fn select_product(&mut self, product_id: &str) {
        if self.product_id.as_deref() != Some(product_id) {
            self.attached_documents.clear();
        }
        self.product_id = Some(product_id.to_string());
    }

    pub fn attach_document(&mut self, document_id: &str) {
        self.attached_documents.insert(document_id.to_string());
    }

    pub fn detach_document(&mut self, document_id: &str) {
        self.attached_documents.remove(document_id);
    }

    pub fn product<'a>(&self, catalog: &'a ProductCatalog) -> LendingResult<&'a LoanProduct> {
        let id = self
            .product_id
            .as_deref()
            .ok_or_else(|| LendingError::invalid("product_id", "Select a loan product."))?;
        catalog.get(id)
    }

    pub fn validate_step(&self, step: ApplicationStep, catalog: &ProductCatalog) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match step {
            ApplicationStep::ProductSelection => {
                if let Err(e) = self.product(catalog) {
                    errors.add("product_id", e.to_string());
                }
            }
            ApplicationStep::Amount => self.check_amount(catalog, &mut errors),
            ApplicationStep::Capacity => self.check_capacity(&mut errors),
            ApplicationStep::Documents => match self.product(catalog) {
                Ok(product) => {
                    for doc in product.mandatory_documents() {
                        if !self.attached_documents.contains(&doc.id) {
                            errors.add(&format!("documents.{}", doc.id), format!("{} is required.", doc.name));
                        }
                    }
                }
                Err(e) => errors.add("product_id", e.to_string()),
            },
            ApplicationStep::Confirmation => {
                if !self.accepts_terms {
                    errors.add("accepts_terms", "The terms and conditions must be accepted.");
                }
            }
        }
        errors
    }

    /// Every step's checks, merged.
    pub fn validate_all(&self, catalog: &ProductCatalog) -> ValidationErrors {
        let mut all = ValidationErrors::new();
        for step in ApplicationStep::ALL {
            let errors = self.validate_step(step, catalog);
            for field in errors.fields() {
                if let Some(message) = errors.get(field) {
                    all.add(field, message);
                }
            }
        }
        all
    }

    /// Move to the next step if the current one passes.
    pub fn advance(&mut self, catalog: &ProductCatalog) -> LendingResult<ApplicationStep> {
        self.validate_step(self.step, catalog).into_result()?;
        let next = self.step.next().ok_or_else(|| {
            LendingError::invalid("step", "Already at the final step; submit the application.")
        })?;
        self.step = next;
        Ok(next)
    }

    /// Step back. Staying on the first step is not an error.
    pub fn back(&mut self) -> ApplicationStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Simulation for the current product, amount and term.
    pub fn simulation(&self, catalog: &ProductCatalog) -> LendingResult<LoanSimulationResult> {
        let product = self.product(catalog)?;
        let (amount, term) = self.amount_and_term()?;
        product.simulate(amount, term)
    }

    pub fn affordability(&self, catalog: &ProductCatalog) -> LendingResult<AffordabilityAssessment> {
        let simulation = self.simulation(catalog)?;
        let income = self
            .monthly_income
            .ok_or_else(|| LendingError::invalid("monthly_income", "Monthly income is required."))?;
        let expenses = self.monthly_expenses.unwrap_or(Decimal::ZERO);
        calculate_affordability(income, expenses, simulation.monthly_payment)
    }

    /// Validate every step and record the request as pending.
    pub fn submit(
        &self,
        catalog: &ProductCatalog,
        store: &mut impl LoanRecordStore,
    ) -> LendingResult<LoanRecord> {
        self.validate_all(catalog).into_result()?;

        let product = self.product(catalog)?;
        let (amount, term) = self.amount_and_term()?;
        let simulation = product.simulate(amount, term)?;

        if let Ok(assessment) = self.affordability(catalog) {
            if !assessment.within_guideline {
                tracing::warn!(
                    member = self.member_id,
                    ratio = %assessment.payment_to_income_ratio,
                    "application submitted above debt-to-income guideline"
                );
            }
        }

        store.insert(NewLoanRecord {
            member_id: self.member_id,
            product_id: product.id.clone(),
            principal: amount,
            term_months: term,
            annual_rate_percent: product.annual_rate_percent,
            purpose: self.purpose.trim().to_string(),
            simulation,
            status: LoanStatus::Pending,
            disbursement_date: None,
            notes: None,
        })
    }

    fn amount_and_term(&self) -> LendingResult<(Money, Months)> {
        let amount = self
            .amount
            .ok_or_else(|| LendingError::invalid("amount", "Amount is required."))?;
        let term = self
            .term_months
            .ok_or_else(|| LendingError::invalid("term_months", "Term is required."))?;
        Ok((amount, term))
    }

    fn check_amount(&self, catalog: &ProductCatalog, errors: &mut ValidationErrors) {
        match self.product(catalog) {
            Ok(product) => match self.amount_and_term() {
                Ok((amount, term)) => {
                    if let Err(e) = product.check_bounds(amount, term) {
                        let field = match e {
                            LendingError::OutOfBounds { ref field, .. } => field.clone(),
                            _ => "amount".to_string(),
                        };
                        errors.add(&field, e.to_string());
                    }
                }
                Err(LendingError::InvalidInput { field, reason }) => errors.add(&field, reason),
                Err(e) => errors.add("amount", e.to_string()),
            },
            Err(e) => errors.add("product_id", e.to_string()),
        }
        if self.purpose.trim().chars().count() <= MIN_PURPOSE_CHARS {
            errors.add(
                "purpose",
                format!("Describe the purpose in more than {MIN_PURPOSE_CHARS} characters."),
            );
        }
    }

    fn check_capacity(&self, errors: &mut ValidationErrors) {
        match self.monthly_income {
            Some(income) if income > Decimal::ZERO => {
                match self.monthly_expenses {
                    Some(expenses) if expenses < Decimal::ZERO => {
                        errors.add("monthly_expenses", "Monthly expenses cannot be negative.")
                    }
                    Some(expenses) if expenses >= income => errors.add(
                        "monthly_expenses",
                        "Monthly expenses must be lower than monthly income.",
                    ),
                    Some(_) => {}
                    None => errors.add("monthly_expenses", "Monthly expenses are required."),
                }
            }
            _ => errors.add("monthly_income", "Monthly income must be greater than zero."),
        }
    }
}
