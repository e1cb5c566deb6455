use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value::{level_payment, monthly_rate};
use crate::{types::*, LendingError, LendingResult};

/// Terms beyond this are unusual for a cooperative and get flagged.
const LONG_TERM_WARNING_MONTHS: Months = 360;

/// Hard ceiling on the term (100 years).
pub const MAX_TERM_MONTHS: Months = 1200;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSimulationInput {
    /// Amount requested.
    pub principal: Money,
    /// Repayment term in whole months.
    pub term_months: Months,
    /// Nominal annual rate as a percentage (12.5 = 12.5%).
    pub annual_rate_percent: Percent,
}

impl LoanSimulationInput {
    pub fn new(principal: Money, term_months: Months, annual_rate_percent: Percent) -> Self {
        Self {
            principal,
            term_months,
            annual_rate_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSimulationResult {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_repayment: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate a fixed-installment loan and wrap the figures in the standard
/// output envelope.
pub fn simulate(
    input: &LoanSimulationInput,
) -> LendingResult<ComputationOutput<LoanSimulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = calculate_simulation(
        input.principal,
        input.term_months,
        input.annual_rate_percent,
    )?;

    if input.term_months > LONG_TERM_WARNING_MONTHS {
        warnings.push(format!(
            "Term of {} months exceeds {} months; check the product allows it.",
            input.term_months, LONG_TERM_WARNING_MONTHS
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_rate": monthly_rate(input.annual_rate_percent).to_string(),
        "compounding": "monthly",
        "payment_timing": "end_of_period",
    });

    Ok(with_metadata(
        "Level-payment amortisation (French method)",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

/// Fixed monthly installment, total interest and total repayment for an
/// amortising loan.
///
/// Values keep full decimal precision. Round only when presenting them.
pub fn calculate_simulation(
    principal: Money,
    term_months: Months,
    annual_rate_percent: Percent,
) -> LendingResult<LoanSimulationResult> {
    validate(principal, term_months, annual_rate_percent)?;

    let rate = monthly_rate(annual_rate_percent);
    let monthly_payment = level_payment(principal, rate, term_months)?;
    if monthly_payment <= Decimal::ZERO {
        return Err(LendingError::invalid(
            "principal",
            "Principal is too small to spread over the term.",
        ));
    }

    // Interest-free loans repay the principal exactly, whatever P / N rounds to.
    let (total_repayment, total_interest) = if rate.is_zero() {
        (principal, Decimal::ZERO)
    } else {
        let total_repayment = monthly_payment
            .checked_mul(Decimal::from(term_months))
            .ok_or_else(|| {
                LendingError::FinancialImpossibility(
                    "total repayment overflows decimal range".into(),
                )
            })?;
        (total_repayment, total_repayment - principal)
    };

    tracing::debug!(
        %principal,
        term_months,
        %annual_rate_percent,
        %monthly_payment,
        "loan simulated"
    );

    Ok(LoanSimulationResult {
        monthly_payment,
        total_interest,
        total_repayment,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

pub(crate) fn validate(
    principal: Money,
    term_months: Months,
    annual_rate_percent: Percent,
) -> LendingResult<()> {
    if principal <= Decimal::ZERO {
        return Err(LendingError::invalid(
            "principal",
            "Principal must be greater than zero.",
        ));
    }
    if term_months == 0 {
        return Err(LendingError::invalid(
            "term_months",
            "Term must be at least one month.",
        ));
    }
    if term_months > MAX_TERM_MONTHS {
        return Err(LendingError::invalid(
            "term_months",
            format!("Term cannot exceed {MAX_TERM_MONTHS} months."),
        ));
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(LendingError::invalid(
            "annual_rate_percent",
            "Interest rate cannot be negative.",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
