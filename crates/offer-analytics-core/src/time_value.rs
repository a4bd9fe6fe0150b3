use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::OfferAnalyticsError;
use crate::types::{round_half_up, with_metadata, ComputationOutput, Money, Percent};
use crate::OfferAnalyticsResult;

const MONTHS_PER_YEAR: u32 = 12;

/// Longest repayment term accepted anywhere in the engine.
pub const MAX_TERM_YEARS: u32 = 50;

/// Compute base^n by repeated multiplication, failing instead of panicking
/// on overflow.
fn checked_pow(base: Decimal, n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

fn overflow(field: &str, what: &str) -> OfferAnalyticsError {
    OfferAnalyticsError::InvalidInput {
        field: field.into(),
        reason: format!("{what} overflows"),
    }
}

/// Number of monthly instalments over a term in whole years.
pub fn payment_count(term_years: u32) -> OfferAnalyticsResult<u32> {
    if term_years > MAX_TERM_YEARS {
        return Err(OfferAnalyticsError::InvalidInput {
            field: "term_years".into(),
            reason: format!("Term cannot exceed {MAX_TERM_YEARS} years"),
        });
    }
    term_years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| overflow("term_years", "Instalment count"))
}

/// Level monthly payment for a repayment mortgage (standard annuity formula).
///
/// `annual_rate` is a percentage (3.5 = 3.5%). A zero rate repays the
/// principal in equal instalments.
pub fn monthly_payment(
    principal: Money,
    annual_rate: Percent,
    term_years: u32,
) -> OfferAnalyticsResult<Money> {
    if term_years == 0 {
        return Err(OfferAnalyticsError::InvalidInput {
            field: "term_years".into(),
            reason: "Term must be at least one year".into(),
        });
    }
    if annual_rate < Decimal::ZERO {
        return Err(OfferAnalyticsError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }

    let n = payment_count(term_years)?;
    let monthly_rate = annual_rate / dec!(100) / Decimal::from(MONTHS_PER_YEAR);

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(n));
    }

    let growth = Decimal::ONE
        .checked_add(monthly_rate)
        .and_then(|base| checked_pow(base, n))
        .ok_or_else(|| {
            overflow(
                "annual_rate",
                &format!("Compounding {annual_rate}% over {n} months"),
            )
        })?;

    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        return Err(OfferAnalyticsError::DivisionByZero {
            context: "annuity growth factor".into(),
        });
    }

    // growth / (growth - 1) stays near 1, so divide before scaling by principal.
    growth
        .checked_div(denominator)
        .and_then(|factor| factor.checked_mul(monthly_rate))
        .and_then(|per_unit| per_unit.checked_mul(principal))
        .ok_or_else(|| overflow("principal", "Annuity payment"))
}

/// Sum of every instalment over the term.
pub fn total_repayment(monthly: Money, term_years: u32) -> OfferAnalyticsResult<Money> {
    let n = payment_count(term_years)?;
    monthly
        .checked_mul(Decimal::from(n))
        .ok_or_else(|| overflow("monthly_payment", "Total repayment"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub principal: Money,
    /// Annual rate as a percentage.
    pub annual_rate: Percent,
    pub term_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub monthly_payment: Money,
    pub payment_count: u32,
    pub total_repayment: Money,
    pub total_interest: Money,
}

/// Annuity payment with repayment totals, rounded to cents.
pub fn calculate_payment(
    input: &PaymentInput,
) -> OfferAnalyticsResult<ComputationOutput<PaymentSchedule>> {
    let start = Instant::now();
    if input.principal <= Decimal::ZERO {
        return Err(OfferAnalyticsError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }

    let monthly = monthly_payment(input.principal, input.annual_rate, input.term_years)?;
    let total = total_repayment(monthly, input.term_years)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level annuity payment, monthly compounding",
        input,
        Vec::new(),
        elapsed,
        PaymentSchedule {
            monthly_payment: round_half_up(monthly, 2),
            payment_count: payment_count(input.term_years)?,
            total_repayment: round_half_up(total, 2),
            total_interest: round_half_up(total - input.principal, 2),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_payment_standard_mortgage() {
        let pmt = monthly_payment(dec!(300000), dec!(3.5), 30).unwrap();
        // 300k over 30 years at 3.5% ≈ 1347.13
        assert!((pmt - dec!(1347.13)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_monthly_payment_zero_rate() {
        let pmt = monthly_payment(dec!(120000), Decimal::ZERO, 10).unwrap();
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_monthly_payment_rejects_zero_term() {
        assert!(monthly_payment(dec!(100000), dec!(4), 0).is_err());
    }

    #[test]
    fn test_monthly_payment_rejects_negative_rate() {
        assert!(monthly_payment(dec!(100000), dec!(-1), 25).is_err());
    }

    #[test]
    fn test_calculate_payment_schedule() {
        let out = calculate_payment(&PaymentInput {
            principal: dec!(120000),
            annual_rate: Decimal::ZERO,
            term_years: 10,
        })
        .unwrap();
        assert_eq!(out.result.monthly_payment, dec!(1000));
        assert_eq!(out.result.payment_count, 120);
        assert_eq!(out.result.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_calculate_payment_rejects_zero_principal() {
        let err = calculate_payment(&PaymentInput {
            principal: Decimal::ZERO,
            annual_rate: dec!(3),
            term_years: 20,
        })
        .unwrap_err();
        assert!(matches!(err, OfferAnalyticsError::InvalidInput { .. }));
    }

    #[test]
    fn test_term_beyond_limit_is_an_error() {
        assert!(payment_count(MAX_TERM_YEARS).is_ok());
        assert!(payment_count(400_000_000).is_err());
        assert!(monthly_payment(dec!(100000), dec!(4), 400_000_000).is_err());
        assert!(total_repayment(dec!(1000), u32::MAX).is_err());
    }

    #[test]
    fn test_overflowing_payment_is_an_error() {
        // 1200% a year is 100% a month: growth 2^12 scales the largest principal past MAX.
        let err = monthly_payment(Decimal::MAX, dec!(1200), 1).unwrap_err();
        assert!(matches!(err, OfferAnalyticsError::InvalidInput { ref field, .. } if field == "principal"));
        let err = monthly_payment(dec!(100000), dec!(2000), MAX_TERM_YEARS).unwrap_err();
        assert!(matches!(err, OfferAnalyticsError::InvalidInput { ref field, .. } if field == "annual_rate"));
        assert!(total_repayment(Decimal::MAX, 30).is_err());
    }

    #[test]
    fn test_total_repayment() {
        assert_eq!(total_repayment(dec!(1000), 25).unwrap(), dec!(300000));
    }
}
