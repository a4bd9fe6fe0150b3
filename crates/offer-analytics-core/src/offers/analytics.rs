//! Per-offer cost analytics and rate ranking.
//!
//! Ranking is relative to the whole offer set, so every figure here must be
//! recomputed whenever the set changes.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::affordability::AffordabilityAssumptions;
use super::offer::Offer;
use crate::error::OfferAnalyticsError;
use crate::time_value::total_repayment;
use crate::types::{round_half_up, Money, Percent};
use crate::OfferAnalyticsResult;

// ---------------------------------------------------------------------------
// Rate ranking
// ---------------------------------------------------------------------------

/// Position of an offer's rate within its comparison set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRank {
    /// 1-based; offers with equal rates share the lowest position.
    pub rank: usize,
    pub set_size: usize,
}

impl RateRank {
    /// Rank of `rate` in the ascending rate list of `offers`.
    ///
    /// Equal rates collapse onto the first matching position, so two offers
    /// at 3.5% in a set of three both rank 1 when 3.5% is the lowest.
    pub fn of(rate: Percent, offers: &[Offer]) -> OfferAnalyticsResult<Self> {
        if offers.is_empty() {
            return Err(OfferAnalyticsError::EmptyOfferSet {
                operation: "rate ranking".into(),
                required: 1,
                actual: 0,
            });
        }
        let below = offers.iter().filter(|o| o.interest_rate < rate).count();
        Ok(Self {
            rank: below + 1,
            set_size: offers.len(),
        })
    }

    /// (N − rank + 1) / N as a fraction; 1 for the cheapest rate.
    pub fn standing(&self) -> Decimal {
        let n = Decimal::from(self.set_size);
        let from_top = Decimal::from(self.set_size + 1) - Decimal::from(self.rank);
        from_top / n
    }

    pub fn percentile(&self) -> Percent {
        round_half_up(self.standing() * dec!(100), 0)
    }

    /// Rank falls within the cheapest `fraction` of the set (rounded up).
    pub fn within_top(&self, fraction: Decimal) -> bool {
        Decimal::from(self.rank) <= (Decimal::from(self.set_size) * fraction).ceil()
    }

    /// Rank falls past the first `fraction` of the set (rounded up).
    pub fn beyond(&self, fraction: Decimal) -> bool {
        !self.within_top(fraction)
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferAnalytics {
    /// Monthly payment over the full term.
    pub total_cost: Money,
    /// Total cost less the principal.
    pub total_interest: Money,
    /// Average annual interest as a percentage of principal.
    pub effective_rate: Percent,
    /// Monthly payment per 1,000 borrowed.
    pub cost_per_thousand: Money,
    pub rate_rank: usize,
    pub rate_percentile: Percent,
    pub fees_to_loan_ratio: Percent,
    pub payment_to_income_ratio: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analytics for `offer` relative to `all_offers` under default assumptions.
pub fn compute_analytics(offer: &Offer, all_offers: &[Offer]) -> OfferAnalyticsResult<OfferAnalytics> {
    compute_analytics_with(offer, all_offers, &AffordabilityAssumptions::default())
}

pub fn compute_analytics_with(
    offer: &Offer,
    all_offers: &[Offer],
    assumptions: &AffordabilityAssumptions,
) -> OfferAnalyticsResult<OfferAnalytics> {
    offer.validate()?;
    assumptions.validate()?;

    let principal = offer.max_loan_amount;
    let term = Decimal::from(offer.term);

    let total_cost = total_cost(offer)?;
    let total_interest = total_cost - principal;
    let effective_rate = total_interest / principal / term * dec!(100);

    let rank = RateRank::of(offer.interest_rate, all_offers)?;

    Ok(OfferAnalytics {
        total_cost: round_half_up(total_cost, 0),
        total_interest: round_half_up(total_interest, 0),
        effective_rate: round_half_up(effective_rate, 2),
        cost_per_thousand: round_half_up(offer.monthly_payment / principal * dec!(1000), 2),
        rate_rank: rank.rank,
        rate_percentile: rank.percentile(),
        fees_to_loan_ratio: offer.fees.arrangement_fee / principal * dec!(100),
        payment_to_income_ratio: payment_to_income_ratio(offer.monthly_payment, assumptions),
    })
}

/// Unrounded payment-derived total cost over the term.
pub fn total_cost(offer: &Offer) -> OfferAnalyticsResult<Money> {
    total_repayment(offer.monthly_payment, offer.term)
        .map_err(|e| offer.invalid("monthly_payment", &e.to_string()))
}

/// Payment as a percentage of the income implied by the same payment.
/// Zero when the payment is zero.
fn payment_to_income_ratio(payment: Money, assumptions: &AffordabilityAssumptions) -> Percent {
    let income = assumptions.implied_income(payment);
    if income.is_zero() {
        return Decimal::ZERO;
    }
    round_half_up(payment / income * dec!(100), 0)
}
