use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::analytics::total_cost;
use super::offer::Offer;
use crate::types::{round_half_up, Money, Percent};
use crate::OfferAnalyticsResult;

/// Set-level aggregates. Every figure is zero for an empty set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferSummary {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub average_rate: Percent,
    pub best_rate: Percent,
    pub worst_rate: Percent,
    pub average_monthly_payment: Money,
    /// Gap between the dearest and cheapest total cost.
    pub potential_savings: Money,
    pub lender_count: usize,
}

pub fn summarize(offers: &[Offer], now: DateTime<Utc>) -> OfferAnalyticsResult<OfferSummary> {
    let Some((best_rate, worst_rate)) = rate_bounds(offers) else {
        return Ok(OfferSummary::default());
    };

    for offer in offers {
        offer.validate()?;
    }

    let n = Decimal::from(offers.len());
    let expired = offers.iter().filter(|o| o.is_expired(now)).count();
    let rate_sum: Decimal = offers.iter().map(|o| o.interest_rate).sum();
    let payment_sum: Money = offers.iter().map(|o| o.monthly_payment).sum();
    let lenders: HashSet<&str> = offers.iter().map(|o| o.lender_name.as_str()).collect();

    Ok(OfferSummary {
        total: offers.len(),
        active: offers.len() - expired,
        expired,
        average_rate: round_half_up(rate_sum / n, 2),
        best_rate,
        worst_rate,
        average_monthly_payment: round_half_up(payment_sum / n, 0),
        potential_savings: potential_savings(offers)?,
        lender_count: lenders.len(),
    })
}

/// Lowest and highest rate in the set, `None` when empty.
pub fn rate_bounds(offers: &[Offer]) -> Option<(Percent, Percent)> {
    let lowest = offers.iter().map(|o| o.interest_rate).min()?;
    let highest = offers.iter().map(|o| o.interest_rate).max()?;
    Some((lowest, highest))
}

fn potential_savings(offers: &[Offer]) -> OfferAnalyticsResult<Money> {
    if offers.len() < 2 {
        return Ok(Decimal::ZERO);
    }
    let mut lo = Decimal::MAX;
    let mut hi = Decimal::MIN;
    for offer in offers {
        let cost = round_half_up(total_cost(offer)?, 0);
        lo = lo.min(cost);
        hi = hi.max(cost);
    }
    Ok(hi - lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::offer::fixtures::{now, offer};
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_summary_is_zeroed() {
        assert_eq!(summarize(&[], now()).unwrap(), OfferSummary::default());
    }

    #[test]
    fn test_summary_figures() {
        let mut a = offer("a", dec!(3.2));
        a.lender_name = "AIB".into();
        a.monthly_payment = dec!(1300);
        let mut b = offer("b", dec!(3.6));
        b.lender_name = "AIB".into();
        b.monthly_payment = dec!(1361);
        b.valid_until = now() - Duration::days(1);
        let mut c = offer("c", dec!(4.0));
        c.lender_name = "PTSB".into();
        c.monthly_payment = dec!(1432);

        let s = summarize(&[a, b, c], now()).unwrap();
        assert_eq!(
            s,
            OfferSummary {
                total: 3,
                active: 2,
                expired: 1,
                average_rate: dec!(3.6),
                best_rate: dec!(3.2),
                worst_rate: dec!(4.0),
                average_monthly_payment: dec!(1364),
                // (1432 - 1300) * 360
                potential_savings: dec!(47520),
                lender_count: 2,
            }
        );
    }

    #[test]
    fn test_single_offer_has_no_savings() {
        let s = summarize(&[offer("a", dec!(3.5))], now()).unwrap();
        assert_eq!(s.potential_savings, Decimal::ZERO);
        assert_eq!(s.total, 1);
    }

    #[test]
    fn test_offer_expiring_now_counts_as_active() {
        let mut a = offer("a", dec!(3.5));
        a.valid_until = now();
        let s = summarize(&[a], now()).unwrap();
        assert_eq!(s.active, 1);
        assert_eq!(s.expired, 0);
    }
}
