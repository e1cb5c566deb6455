use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::simulation::{calculate_simulation, LoanSimulationInput, LoanSimulationResult};
use crate::time_value::monthly_rate;
use crate::{types::*, LendingResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub period: Months,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub summary: LoanSimulationResult,
    pub rows: Vec<ScheduleRow>,
}

/// Period-by-period repayment table for a level-payment loan.
///
/// The last installment absorbs rounding residue so the loan closes at
/// exactly zero.
pub fn amortization_schedule(
    input: &LoanSimulationInput,
) -> LendingResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let summary = calculate_simulation(
        input.principal,
        input.term_months,
        input.annual_rate_percent,
    )?;
    let rate = monthly_rate(input.annual_rate_percent);

    let mut rows = Vec::new();
    let mut balance = input.principal;

    for period in 1..=input.term_months {
        let interest = balance * rate;
        let (payment, principal) = if period == input.term_months {
            (balance + interest, balance)
        } else {
            (summary.monthly_payment, summary.monthly_payment - interest)
        };
        let closing_balance = balance - principal;

        rows.push(ScheduleRow {
            period,
            opening_balance: balance,
            payment,
            interest,
            principal,
            closing_balance,
        });
        balance = closing_balance;
    }

    tracing::debug!(periods = rows.len(), "amortisation schedule built");

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_rate": rate.to_string(),
        "final_period_adjusted": true,
    });

    Ok(with_metadata(
        "Level-payment amortisation schedule",
        &assumptions,
        warnings,
        elapsed,
        AmortizationSchedule { summary, rows },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_schedule_closes_at_zero() {
        let input = LoanSimulationInput::new(dec!(10_000_000), 24, dec!(12.5));
        let schedule = amortization_schedule(&input).unwrap().result;
        assert_eq!(schedule.rows.len(), 24);
        assert_eq!(schedule.rows.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_principal_column_sums_to_principal() {
        let input = LoanSimulationInput::new(dec!(5_000_000), 36, dec!(11.2));
        let schedule = amortization_schedule(&input).unwrap().result;
        let repaid: Decimal = schedule.rows.iter().map(|r| r.principal).sum();
        assert!((repaid - dec!(5_000_000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_interest_column_matches_summary() {
        let input = LoanSimulationInput::new(dec!(10_000_000), 24, dec!(12.5));
        let schedule = amortization_schedule(&input).unwrap().result;
        let interest: Decimal = schedule.rows.iter().map(|r| r.interest).sum();
        assert!((interest - schedule.summary.total_interest).abs() < dec!(0.000001));
    }

    #[test]
    fn test_first_period_interest() {
        // 12% a year => 1% a month on the opening balance
        let input = LoanSimulationInput::new(dec!(1_000), 12, dec!(12));
        let schedule = amortization_schedule(&input).unwrap().result;
        assert_eq!(schedule.rows[0].interest, dec!(10));
        assert_eq!(schedule.rows[0].opening_balance, dec!(1_000));
    }

    #[test]
    fn test_zero_rate_schedule_is_flat() {
        let input = LoanSimulationInput::new(dec!(1_200), 12, Decimal::ZERO);
        let schedule = amortization_schedule(&input).unwrap().result;
        assert!(schedule.rows.iter().all(|r| r.interest.is_zero()));
        assert!(schedule.rows.iter().all(|r| r.payment == dec!(100)));
    }

    #[test]
    fn test_invalid_input_propagates() {
        let input = LoanSimulationInput::new(dec!(1_000), 0, dec!(12));
        assert!(amortization_schedule(&input).is_err());
    }

    #[test]
    fn test_oversized_term_rejected_before_building_rows() {
        let input = LoanSimulationInput::new(dec!(1_000), u32::MAX, Decimal::ZERO);
        match amortization_schedule(&input).unwrap_err() {
            crate::LendingError::InvalidInput { field, .. } => assert_eq!(field, "term_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
