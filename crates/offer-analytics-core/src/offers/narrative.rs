//! Rule-based pros, cons, risk factors and recommendations for an offer.
//!
//! Downstream consumers assert on these exact strings, so the thresholds and
//! templates are fixed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::affordability::{has_payment_shock, AffordabilityAssumptions};
use super::analytics::RateRank;
use super::offer::Offer;
use super::scoring::compute_suitability_score;
use crate::types::format_amount;
use crate::OfferAnalyticsResult;

const TOP_BAND: Decimal = dec!(0.3);
const BOTTOM_BAND_START: Decimal = dec!(0.7);
const LOW_FEES: Decimal = dec!(1000);
const HIGH_FEES: Decimal = dec!(2000);
const STRONG_RATING: Decimal = dec!(4.5);
const WEAK_RATING: Decimal = dec!(4.0);
const HIGH_LTV: Decimal = dec!(90);
const LONG_TERM_YEARS: u32 = 30;
const EXPIRY_WARNING_DAYS: i64 = 14;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferNarrative {
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Generate every narrative list under the default affordability assumptions.
pub fn generate_narrative(
    offer: &Offer,
    all_offers: &[Offer],
    now: DateTime<Utc>,
) -> OfferAnalyticsResult<OfferNarrative> {
    generate_narrative_with(offer, all_offers, now, &AffordabilityAssumptions::default())
}

pub fn generate_narrative_with(
    offer: &Offer,
    all_offers: &[Offer],
    now: DateTime<Utc>,
    assumptions: &AffordabilityAssumptions,
) -> OfferAnalyticsResult<OfferNarrative> {
    offer.validate()?;
    let rank = RateRank::of(offer.interest_rate, all_offers)?;
    let score = compute_suitability_score(offer, all_offers)?;

    Ok(OfferNarrative {
        pros: pros(offer, &rank),
        cons: cons(offer, &rank, now),
        risks: risk_factors(offer, assumptions)?,
        recommendations: recommendations(offer, &rank, score),
    })
}

pub fn pros(offer: &Offer, rank: &RateRank) -> Vec<String> {
    let mut pros = Vec::new();

    if rank.within_top(TOP_BAND) {
        pros.push(format!(
            "Competitive interest rate ({}%)",
            offer.interest_rate.normalize()
        ));
    }
    if offer.fees.upfront() < LOW_FEES {
        pros.push("Low or no arrangement fees".to_string());
    }
    if offer.decision_in_principle {
        pros.push("Decision in principle available".to_string());
    }
    if offer.rating >= STRONG_RATING {
        pros.push(format!("Highly rated lender ({}/5)", offer.rating.normalize()));
    }
    if offer.feature_count() > 3 {
        pros.push("Comprehensive product features".to_string());
    }
    if offer.term >= LONG_TERM_YEARS {
        pros.push("Flexible loan terms available".to_string());
    }

    pros
}

pub fn cons(offer: &Offer, rank: &RateRank, now: DateTime<Utc>) -> Vec<String> {
    let mut cons = Vec::new();

    if rank.beyond(BOTTOM_BAND_START) {
        cons.push("Higher interest rate compared to alternatives".to_string());
    }
    let upfront = offer.fees.upfront();
    if upfront > HIGH_FEES {
        cons.push(format!("High arrangement fees (€{})", format_amount(upfront)));
    }
    if !offer.decision_in_principle {
        cons.push("No decision in principle available".to_string());
    }
    if offer.rating < WEAK_RATING {
        cons.push(format!("Lower lender rating ({}/5)", offer.rating.normalize()));
    }
    if offer.feature_count() < 2 {
        cons.push("Limited product features".to_string());
    }
    let days = offer.days_until_expiry(now);
    if days <= EXPIRY_WARNING_DAYS {
        cons.push(format!("Offer expires soon ({days} days)"));
    }

    cons
}

pub fn risk_factors(
    offer: &Offer,
    assumptions: &AffordabilityAssumptions,
) -> OfferAnalyticsResult<Vec<String>> {
    let mut risks = Vec::new();

    if offer.is_variable_rate() {
        risks.push("Interest rate may increase over time".to_string());
    }
    if offer.loan_to_value > HIGH_LTV {
        risks.push("High loan-to-value ratio may impact terms".to_string());
    }
    if has_payment_shock(offer, assumptions)? {
        risks.push("Payments may become unaffordable if rates increase".to_string());
    }
    if offer.rating < WEAK_RATING {
        risks.push("Lower-rated lender may have service issues".to_string());
    }

    Ok(risks)
}

pub fn recommendations(offer: &Offer, rank: &RateRank, score: u32) -> Vec<String> {
    let mut recs = Vec::new();

    let headline = match score {
        80.. => "Highly recommended - excellent overall value",
        60..=79 => "Good option - consider alongside top alternatives",
        _ => "Consider carefully - may not be the best available option",
    };
    recs.push(headline.to_string());

    if rank.rank == 1 {
        recs.push("Best available interest rate".to_string());
    } else if rank.rank <= 3 {
        recs.push("Competitive interest rate".to_string());
    }
    if offer.fees.upfront().is_zero() {
        recs.push("No arrangement fees - excellent value".to_string());
    }
    if offer.decision_in_principle {
        recs.push("Decision in principle available - faster processing".to_string());
    }

    recs
}

/// Coarse "how long ago" label for an offer's creation time.
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds();
    match seconds {
        s if s < 60 => "Just now".to_string(),
        s if s < 3_600 => format!("{} minutes ago", s / 60),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s if s < 604_800 => format!("{} days ago", s / 86_400),
        s => format!("{} weeks ago", s / 604_800),
    }
}
