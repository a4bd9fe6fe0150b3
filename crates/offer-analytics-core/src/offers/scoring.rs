//! Composite 0–100 suitability score and its competitiveness label.
//!
//! The score is set-relative: the rate component depends on where the offer
//! ranks among its peers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::analytics::RateRank;
use super::offer::{Offer, MAX_LENDER_RATING};
use crate::types::{round_half_up, Money, Percent};
use crate::OfferAnalyticsResult;

const BASE_SCORE: Decimal = dec!(50);
const RATE_WEIGHT: Decimal = dec!(30);
const FEATURE_POINTS_EACH: Decimal = dec!(3);
const FEATURE_POINTS_CAP: Decimal = dec!(15);
const DIP_POINTS: Decimal = dec!(10);
const RATING_WEIGHT: Decimal = dec!(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Competitiveness {
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl std::fmt::Display for Competitiveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        };
        write!(f, "{}", s)
    }
}

/// Score components before clamping, kept for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: Decimal,
    pub rate: Decimal,
    pub fees: Decimal,
    pub features: Decimal,
    pub decision_in_principle: Decimal,
    pub rating: Decimal,
    pub loan_to_value: Decimal,
}

impl ScoreBreakdown {
    pub fn raw_total(&self) -> Decimal {
        self.base
            + self.rate
            + self.fees
            + self.features
            + self.decision_in_principle
            + self.rating
            + self.loan_to_value
    }

    /// Clamped to [0, 100] and rounded half up.
    pub fn score(&self) -> u32 {
        let clamped = self.raw_total().clamp(Decimal::ZERO, dec!(100));
        round_half_up(clamped, 0).to_u32().unwrap_or(0)
    }
}

/// Itemised score for `offer` within `all_offers`.
pub fn score_breakdown(offer: &Offer, all_offers: &[Offer]) -> OfferAnalyticsResult<ScoreBreakdown> {
    offer.validate()?;
    let rank = RateRank::of(offer.interest_rate, all_offers)?;
    let features = (FEATURE_POINTS_EACH * Decimal::from(offer.feature_count())).min(FEATURE_POINTS_CAP);

    Ok(ScoreBreakdown {
        base: BASE_SCORE,
        rate: rank.standing() * RATE_WEIGHT,
        fees: fee_points(offer.fees.total()),
        features,
        decision_in_principle: if offer.decision_in_principle {
            DIP_POINTS
        } else {
            Decimal::ZERO
        },
        rating: offer.rating / MAX_LENDER_RATING * RATING_WEIGHT,
        loan_to_value: ltv_points(offer.loan_to_value),
    })
}

/// Suitability score in [0, 100].
pub fn compute_suitability_score(offer: &Offer, all_offers: &[Offer]) -> OfferAnalyticsResult<u32> {
    Ok(score_breakdown(offer, all_offers)?.score())
}

pub fn classify_competitiveness(score: u32) -> Competitiveness {
    match score {
        85.. => Competitiveness::Excellent,
        70..=84 => Competitiveness::VeryGood,
        55..=69 => Competitiveness::Good,
        40..=54 => Competitiveness::Fair,
        _ => Competitiveness::Poor,
    }
}

fn fee_points(total_fees: Money) -> Decimal {
    if total_fees < dec!(1000) {
        dec!(20)
    } else if total_fees < dec!(2000) {
        dec!(15)
    } else if total_fees < dec!(3000) {
        dec!(10)
    } else {
        dec!(5)
    }
}

fn ltv_points(ltv: Percent) -> Decimal {
    if ltv < dec!(80) {
        dec!(10)
    } else if ltv < dec!(90) {
        dec!(7)
    } else {
        dec!(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::offer::fixtures::offer;

    #[test]
    fn test_breakdown_components() {
        let mut o = offer("a", dec!(3.5));
        o.fees.arrangement_fee = dec!(1500);
        o.fees.other = dec!(600);
        o.features = vec!["a".into(), "b".into()];
        o.rating = dec!(4);
        o.loan_to_value = dec!(85);
        let other = offer("b", dec!(3.0));
        let all = vec![o.clone(), other];

        let b = score_breakdown(&o, &all).unwrap();
        assert_eq!(b.rate, dec!(15));
        // 2,100 including `other`
        assert_eq!(b.fees, dec!(10));
        assert_eq!(b.features, dec!(6));
        assert_eq!(b.decision_in_principle, Decimal::ZERO);
        assert_eq!(b.rating, dec!(12));
        assert_eq!(b.loan_to_value, dec!(7));
        assert_eq!(b.raw_total(), dec!(100));
        assert_eq!(b.score(), 100);
    }

    #[test]
    fn test_score_is_clamped() {
        let b = ScoreBreakdown {
            base: dec!(50),
            rate: dec!(30),
            fees: dec!(20),
            features: dec!(15),
            decision_in_principle: dec!(10),
            rating: dec!(15),
            loan_to_value: dec!(10),
        };
        assert_eq!(b.score(), 100);
    }

    #[test]
    fn test_score_rounds_half_up() {
        let b = ScoreBreakdown {
            base: dec!(50),
            rate: dec!(7.5),
            fees: Decimal::ZERO,
            features: Decimal::ZERO,
            decision_in_principle: Decimal::ZERO,
            rating: Decimal::ZERO,
            loan_to_value: Decimal::ZERO,
        };
        assert_eq!(b.score(), 58);
    }

    #[test]
    fn test_feature_points_capped() {
        let mut o = offer("a", dec!(3.5));
        o.features = (0..8).map(|i| format!("f{i}")).collect();
        let b = score_breakdown(&o, &[o.clone()]).unwrap();
        assert_eq!(b.features, dec!(15));
    }

    #[test]
    fn test_competitiveness_boundaries() {
        assert_eq!(classify_competitiveness(100), Competitiveness::Excellent);
        assert_eq!(classify_competitiveness(85), Competitiveness::Excellent);
        assert_eq!(classify_competitiveness(84), Competitiveness::VeryGood);
        assert_eq!(classify_competitiveness(70), Competitiveness::VeryGood);
        assert_eq!(classify_competitiveness(69), Competitiveness::Good);
        assert_eq!(classify_competitiveness(55), Competitiveness::Good);
        assert_eq!(classify_competitiveness(54), Competitiveness::Fair);
        assert_eq!(classify_competitiveness(40), Competitiveness::Fair);
        assert_eq!(classify_competitiveness(39), Competitiveness::Poor);
        assert_eq!(classify_competitiveness(0), Competitiveness::Poor);
    }

    #[test]
    fn test_competitiveness_labels() {
        assert_eq!(Competitiveness::VeryGood.to_string(), "Very Good");
        assert_eq!(
            serde_json::to_string(&Competitiveness::VeryGood).unwrap(),
            "\"Very Good\""
        );
    }
}
