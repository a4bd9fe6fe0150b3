//! Affordability stress test.
//!
//! Borrower income is not known to the engine, so it is backed out of the
//! offer's own payment at an assumed payment-to-income ratio. The stress
//! payment re-prices the full loan at the offer rate plus a fixed shock.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::offer::Offer;
use crate::error::OfferAnalyticsError;
use crate::time_value::monthly_payment;
use crate::types::{round_half_up, Fraction, Money, Percent};
use crate::OfferAnalyticsResult;

const MIN_PAYMENT_TO_INCOME: Fraction = dec!(0.01);
const MAX_STRESS_RATE_INCREASE: Percent = dec!(100);
const MAX_PAYMENT_SHOCK_MULTIPLE: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Assumptions
// ---------------------------------------------------------------------------

/// Tunable affordability assumptions. By default a payment may take 35% of
/// gross income and is stressed two points above the offer rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffordabilityAssumptions {
    /// Share of gross monthly income the payment is assumed to consume.
    pub payment_to_income_ratio: Fraction,
    /// Percentage points added to the offer rate for the stress test.
    pub stress_rate_increase: Percent,
    /// Stress payment / income above which risk is HIGH.
    pub high_risk_threshold: Fraction,
    /// Stress payment / income above which risk is MEDIUM.
    pub medium_risk_threshold: Fraction,
    /// Stress payment above this multiple of the nominal payment is flagged
    /// as a payment shock risk.
    pub payment_shock_multiple: Decimal,
}

impl Default for AffordabilityAssumptions {
    fn default() -> Self {
        Self {
            payment_to_income_ratio: dec!(0.35),
            stress_rate_increase: dec!(2.0),
            high_risk_threshold: dec!(0.40),
            medium_risk_threshold: dec!(0.35),
            payment_shock_multiple: dec!(1.3),
        }
    }
}

impl AffordabilityAssumptions {
    pub fn validate(&self) -> OfferAnalyticsResult<()> {
        if self.payment_to_income_ratio < MIN_PAYMENT_TO_INCOME
            || self.payment_to_income_ratio > Decimal::ONE
        {
            return Err(OfferAnalyticsError::InvalidInput {
                field: "payment_to_income_ratio".into(),
                reason: format!("Must be between {MIN_PAYMENT_TO_INCOME} and 1"),
            });
        }
        if self.stress_rate_increase < Decimal::ZERO {
            return Err(OfferAnalyticsError::InvalidInput {
                field: "stress_rate_increase".into(),
                reason: "Stress shock cannot be negative".into(),
            });
        }
        if self.stress_rate_increase > MAX_STRESS_RATE_INCREASE {
            return Err(OfferAnalyticsError::InvalidInput {
                field: "stress_rate_increase".into(),
                reason: format!("Stress shock cannot exceed {MAX_STRESS_RATE_INCREASE} points"),
            });
        }
        if self.medium_risk_threshold <= Decimal::ZERO
            || self.high_risk_threshold < self.medium_risk_threshold
        {
            return Err(OfferAnalyticsError::InvalidInput {
                field: "high_risk_threshold".into(),
                reason: "Risk thresholds must be positive with high >= medium".into(),
            });
        }
        if self.payment_shock_multiple < Decimal::ONE
            || self.payment_shock_multiple > MAX_PAYMENT_SHOCK_MULTIPLE
        {
            return Err(OfferAnalyticsError::InvalidInput {
                field: "payment_shock_multiple".into(),
                reason: format!(
                    "Payment shock multiple must be between 1 and {MAX_PAYMENT_SHOCK_MULTIPLE}"
                ),
            });
        }
        Ok(())
    }

    /// Income implied by a payment under the assumed ratio.
    pub fn implied_income(&self, payment: Money) -> Money {
        payment / self.payment_to_income_ratio
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityMetrics {
    pub assumed_required_income: Money,
    /// Assumed payment-to-income ratio as a percentage.
    pub payment_ratio: Percent,
    pub stress_test_rate: Percent,
    pub stress_test_payment: Money,
    /// Stress payment as a percentage of assumed income.
    pub stress_test_ratio: Percent,
    pub buffer_amount: Money,
    pub risk_level: RiskLevel,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Stress test an offer under the default assumptions.
pub fn compute_affordability(offer: &Offer) -> OfferAnalyticsResult<AffordabilityMetrics> {
    compute_affordability_with(offer, &AffordabilityAssumptions::default())
}

pub fn compute_affordability_with(
    offer: &Offer,
    assumptions: &AffordabilityAssumptions,
) -> OfferAnalyticsResult<AffordabilityMetrics> {
    offer.validate()?;
    assumptions.validate()?;

    let assumed_income = assumptions.implied_income(offer.monthly_payment);
    let stress_rate = offer.interest_rate + assumptions.stress_rate_increase;
    let stress_payment = stress_test_payment(offer, assumptions)?;

    // A zero payment implies zero income; the ratio is then unbounded
    // whenever the stress payment is not also zero.
    let (stress_fraction, risk_level) = if assumed_income.is_zero() {
        let level = if stress_payment > Decimal::ZERO {
            RiskLevel::High
        } else {
            RiskLevel::Low
        };
        (Decimal::ZERO, level)
    } else {
        let fraction = stress_payment / assumed_income;
        (fraction, classify_risk(fraction, assumptions))
    };

    Ok(AffordabilityMetrics {
        assumed_required_income: round_half_up(assumed_income, 0),
        payment_ratio: round_half_up(assumptions.payment_to_income_ratio * dec!(100), 2),
        stress_test_rate: stress_rate,
        stress_test_payment: round_half_up(stress_payment, 0),
        stress_test_ratio: round_half_up(stress_fraction * dec!(100), 0),
        buffer_amount: round_half_up(assumed_income - offer.monthly_payment, 0),
        risk_level,
    })
}

/// Unrounded payment on the full loan at the stressed rate.
pub fn stress_test_payment(
    offer: &Offer,
    assumptions: &AffordabilityAssumptions,
) -> OfferAnalyticsResult<Money> {
    let stress_rate = offer.interest_rate + assumptions.stress_rate_increase;
    monthly_payment(offer.max_loan_amount, stress_rate, offer.term).map_err(|e| {
        offer.invalid("interest_rate", &format!("stress test failed: {e}"))
    })
}

/// True when the stressed payment exceeds the shock multiple of today's payment.
pub fn has_payment_shock(
    offer: &Offer,
    assumptions: &AffordabilityAssumptions,
) -> OfferAnalyticsResult<bool> {
    let stressed = stress_test_payment(offer, assumptions)?;
    Ok(stressed > offer.monthly_payment * assumptions.payment_shock_multiple)
}

/// Thresholds compare against the unrounded fraction, never the rounded percent.
fn classify_risk(fraction: Fraction, assumptions: &AffordabilityAssumptions) -> RiskLevel {
    if fraction > assumptions.high_risk_threshold {
        RiskLevel::High
    } else if fraction > assumptions.medium_risk_threshold {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
