use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::LendingError;
use crate::types::{Money, Months, Percent, Rate};
use crate::LendingResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Convert a nominal annual percentage (12.5) into the monthly periodic rate
/// (0.0104166...).
pub fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / dec!(100) / MONTHS_PER_YEAR
}

/// Compound growth factor `(1 + r)^n`.
pub fn compound_factor(rate: Rate, nper: Months) -> LendingResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| {
            LendingError::FinancialImpossibility(format!(
                "compound factor (1 + {rate})^{nper} overflows decimal range"
            ))
        })
}

/// Level payment that fully amortises `principal` over `nper` periods at the
/// periodic `rate`. Returned as a positive amount.
pub fn level_payment(principal: Money, rate: Rate, nper: Months) -> LendingResult<Money> {
    if nper == 0 {
        return Err(LendingError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(LendingError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| {
            LendingError::FinancialImpossibility("level payment overflows decimal range".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_rate_from_annual_percent() {
        assert_eq!(monthly_rate(dec!(12)), dec!(0.01));
        assert_eq!(monthly_rate(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_compound_factor_basic() {
        // 1.01^2 = 1.0201
        assert_eq!(compound_factor(dec!(0.01), 2).unwrap(), dec!(1.0201));
        assert_eq!(compound_factor(dec!(0.05), 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_level_payment_zero_rate() {
        let result = level_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(result, dec!(100));
    }

    #[test]
    fn test_level_payment_one_percent() {
        // 1000 over 12 months at 1% per month ≈ 88.85
        let result = level_payment(dec!(1000), dec!(0.01), 12).unwrap();
        assert!((result - dec!(88.85)).abs() < dec!(0.01));
    }

    #[test]
    fn test_level_payment_zero_periods() {
        assert!(level_payment(dec!(1000), dec!(0.01), 0).is_err());
    }
}
