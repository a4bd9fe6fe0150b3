//! Market view derived from the borrower's own offers, and the set-level
//! recommendations that lean on it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::offer::Offer;
use super::scoring::compute_suitability_score;
use super::summary::rate_bounds;
use crate::error::OfferAnalyticsError;
use crate::types::{round_half_up, Money, Percent};
use crate::OfferAnalyticsResult;

const GOOD_RATE_MARGIN: Decimal = dec!(0.3);
const FAIR_RATE_MARGIN: Decimal = dec!(0.6);
const BELOW_MARKET_MARGIN: Decimal = dec!(0.2);
const WIDE_SPREAD: Decimal = dec!(0.5);
const DECISION_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRange {
    pub excellent: Percent,
    pub good: Percent,
    pub fair: Percent,
    pub poor: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketComparison {
    pub average_market_rate: Percent,
    pub lowest_market_rate: Percent,
    pub highest_market_rate: Percent,
    pub average_monthly_payment: Money,
    pub rate_range: RateRange,
}

pub fn market_comparison(offers: &[Offer]) -> OfferAnalyticsResult<MarketComparison> {
    let (lowest, highest) = rate_bounds(offers).ok_or_else(|| OfferAnalyticsError::EmptyOfferSet {
        operation: "market comparison".into(),
        required: 1,
        actual: 0,
    })?;
    for offer in offers {
        offer.validate()?;
    }

    let n = Decimal::from(offers.len());
    let rate_sum: Decimal = offers.iter().map(|o| o.interest_rate).sum();
    let payment_sum: Money = offers.iter().map(|o| o.monthly_payment).sum();

    Ok(MarketComparison {
        average_market_rate: round_half_up(rate_sum / n, 2),
        lowest_market_rate: lowest,
        highest_market_rate: highest,
        average_monthly_payment: round_half_up(payment_sum / n, 0),
        rate_range: RateRange {
            excellent: lowest,
            good: lowest + GOOD_RATE_MARGIN,
            fair: lowest + FAIR_RATE_MARGIN,
            poor: highest,
        },
    })
}

/// Advice for the set as a whole.
pub fn overall_recommendations(
    offers: &[Offer],
    market: Option<&MarketComparison>,
    now: DateTime<Utc>,
) -> OfferAnalyticsResult<Vec<String>> {
    let mut recs = Vec::new();

    if offers.is_empty() {
        recs.push(
            "No offers available - consider improving application or trying additional lenders"
                .to_string(),
        );
        return Ok(recs);
    }

    let mut best: Option<(u32, &Offer)> = None;
    for offer in offers {
        let score = compute_suitability_score(offer, offers)?;
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, offer));
        }
    }
    if let Some((_, offer)) = best {
        recs.push(format!(
            "Best overall option: {} - {}",
            offer.lender_name, offer.product_name
        ));
    }

    if let Some((lowest, highest)) = rate_bounds(offers) {
        if let Some(m) = market {
            if lowest <= m.average_market_rate - BELOW_MARKET_MARGIN {
                recs.push(
                    "Excellent rate options available - well below market average".to_string(),
                );
            }
        }
        if highest - lowest > WIDE_SPREAD {
            recs.push(
                "Significant rate differences between offers - careful comparison recommended"
                    .to_string(),
            );
        }
    }

    let expiring = offers
        .iter()
        .filter(|o| o.days_until_expiry(now) <= DECISION_WINDOW_DAYS)
        .count();
    if expiring > 0 {
        recs.push(format!(
            "{expiring} offers expiring within {DECISION_WINDOW_DAYS} days - decision needed soon"
        ));
    }

    Ok(recs)
}
