use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{types::*, LendingError, LendingResult};

/// Maximum share of monthly income a loan installment may take.
pub const DEBT_TO_INCOME_GUIDELINE: Rate = dec!(0.40);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityInput {
    pub monthly_income: Money,
    pub monthly_expenses: Money,
    pub monthly_payment: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityAssessment {
    pub disposable_income: Money,
    pub payment_to_income_ratio: Rate,
    pub within_guideline: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Debt-to-income check for a prospective borrower, with advisories attached
/// as warnings.
pub fn assess_affordability(
    input: &AffordabilityInput,
) -> LendingResult<ComputationOutput<AffordabilityAssessment>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = calculate_affordability(
        input.monthly_income,
        input.monthly_expenses,
        input.monthly_payment,
    )?;

    if !result.within_guideline {
        let guideline = DEBT_TO_INCOME_GUIDELINE * dec!(100);
        warnings.push(match result.payment_to_income_ratio.checked_mul(dec!(100)) {
            Some(share) => format!(
                "Installment takes {}% of income, above the {guideline}% guideline. \
                 Consider a smaller amount or a longer term.",
                share.round_dp(1)
            ),
            None => format!(
                "Installment is far above the {guideline}% guideline. \
                 Consider a smaller amount or a longer term."
            ),
        });
    }
    if input.monthly_payment > result.disposable_income {
        warnings.push("Installment exceeds disposable income after expenses.".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "debt_to_income_guideline": DEBT_TO_INCOME_GUIDELINE.to_string(),
    });

    Ok(with_metadata(
        "Payment-to-income affordability test",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

/// Disposable income, payment-to-income ratio and whether the ratio stays at
/// or below [`DEBT_TO_INCOME_GUIDELINE`].
pub fn calculate_affordability(
    monthly_income: Money,
    monthly_expenses: Money,
    monthly_payment: Money,
) -> LendingResult<AffordabilityAssessment> {
    if monthly_income <= Decimal::ZERO {
        return Err(LendingError::invalid(
            "monthly_income",
            "Monthly income must be greater than zero.",
        ));
    }
    if monthly_expenses < Decimal::ZERO {
        return Err(LendingError::invalid(
            "monthly_expenses",
            "Monthly expenses cannot be negative.",
        ));
    }
    if monthly_payment < Decimal::ZERO {
        return Err(LendingError::invalid(
            "monthly_payment",
            "Monthly payment cannot be negative.",
        ));
    }

    let disposable_income = monthly_income - monthly_expenses;
    let payment_to_income_ratio = monthly_payment
        .checked_div(monthly_income)
        .ok_or_else(|| {
            LendingError::FinancialImpossibility(
                "payment-to-income ratio overflows decimal range".into(),
            )
        })?;
    let within_guideline = payment_to_income_ratio <= DEBT_TO_INCOME_GUIDELINE;

    if !within_guideline {
        tracing::warn!(
            ratio = %payment_to_income_ratio,
            "installment above debt-to-income guideline"
        );
    }

    Ok(AffordabilityAssessment {
        disposable_income,
        payment_to_income_ratio,
        within_guideline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_comfortable_borrower() {
        let a = calculate_affordability(dec!(2_000_000), dec!(800_000), dec!(500_000)).unwrap();
        assert_eq!(a.disposable_income, dec!(1_200_000));
        assert_eq!(a.payment_to_income_ratio, dec!(0.25));
        assert!(a.within_guideline);
    }

    #[test]
    fn test_guideline_breach() {
        let a = calculate_affordability(dec!(1_000_000), Decimal::ZERO, dec!(450_000)).unwrap();
        assert_eq!(a.payment_to_income_ratio, dec!(0.45));
        assert!(!a.within_guideline);
    }

    #[test]
    fn test_exactly_at_guideline_passes() {
        let a = calculate_affordability(dec!(1_000_000), Decimal::ZERO, dec!(400_000)).unwrap();
        assert!(a.within_guideline);
    }

    #[test]
    fn test_zero_income_rejected() {
        let err = calculate_affordability(Decimal::ZERO, Decimal::ZERO, dec!(1)).unwrap_err();
        match err {
            LendingError::InvalidInput { field, .. } => assert_eq!(field, "monthly_income"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_ratio_overflow_is_reported() {
        let payment = Decimal::from_scientific("1e25").unwrap();
        let err = calculate_affordability(dec!(0.0000001), Decimal::ZERO, payment).unwrap_err();
        assert!(matches!(err, LendingError::FinancialImpossibility(_)));
    }

    #[test]
    fn test_unprintable_share_falls_back_to_plain_warning() {
        let input = AffordabilityInput {
            monthly_income: Decimal::ONE,
            monthly_expenses: Decimal::ZERO,
            monthly_payment: Decimal::from_scientific("1e27").unwrap(),
        };
        let output = assess_affordability(&input).unwrap();
        assert!(output.warnings[0].starts_with("Installment is far above the 40"));
    }

    #[test]
    fn test_breach_produces_warnings() {
        let input = AffordabilityInput {
            monthly_income: dec!(1_000_000),
            monthly_expenses: dec!(700_000),
            monthly_payment: dec!(450_000),
        };
        let output = assess_affordability(&input).unwrap();
        assert!(!output.result.within_guideline);
        // above guideline and above disposable income
        assert_eq!(output.warnings.len(), 2);
    }
}
