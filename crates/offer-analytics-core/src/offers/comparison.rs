//! Cross-offer comparison: headline winners across a whole set, and a
//! factor-by-factor comparison of a hand-picked subset.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use super::affordability::AffordabilityAssumptions;
use super::analytics::{compute_analytics_with, total_cost, OfferAnalytics};
use super::offer::Offer;
use super::scoring::compute_suitability_score;
use crate::error::OfferAnalyticsError;
use crate::types::{format_amount, round_half_up, with_metadata, ComputationOutput, Money};
use crate::OfferAnalyticsResult;

/// Fewest and most offers a factor comparison accepts.
pub const MIN_COMPARISON_OFFERS: usize = 2;
pub const MAX_COMPARISON_OFFERS: usize = 5;

// ---------------------------------------------------------------------------
// Headline comparison
// ---------------------------------------------------------------------------

/// The offer that won a comparison, with the value it won on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferPick {
    pub id: String,
    pub lender_name: String,
    pub product_name: String,
    pub value: Decimal,
}

impl OfferPick {
    fn new(offer: &Offer, value: Decimal) -> Self {
        Self {
            id: offer.id.clone(),
            lender_name: offer.lender_name.clone(),
            product_name: offer.product_name.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub best_overall: OfferPick,
    pub lowest_rate: OfferPick,
    pub lowest_monthly_payment: OfferPick,
    pub lowest_total_cost: OfferPick,
    pub most_features: OfferPick,
}

/// Pick the winners of a set. `None` when there are fewer than two offers.
///
/// Ties go to whichever offer appears first.
pub fn compare_offers(offers: &[Offer]) -> OfferAnalyticsResult<Option<Comparison>> {
    if offers.len() < MIN_COMPARISON_OFFERS {
        return Ok(None);
    }

    let scores = offers
        .iter()
        .map(|o| compute_suitability_score(o, offers).map(Decimal::from))
        .collect::<OfferAnalyticsResult<Vec<_>>>()?;
    let total_costs = offers
        .iter()
        .map(|o| total_cost(o).map(|c| round_half_up(c, 0)))
        .collect::<OfferAnalyticsResult<Vec<Money>>>()?;
    let rates: Vec<Decimal> = offers.iter().map(|o| o.interest_rate).collect();
    let payments: Vec<Money> = offers.iter().map(|o| o.monthly_payment).collect();
    let features: Vec<Decimal> = offers
        .iter()
        .map(|o| Decimal::from(o.feature_count()))
        .collect();

    let pick = |values: &[Decimal], goal: Goal| {
        let idx = winner_index(values, goal);
        OfferPick::new(&offers[idx], values[idx])
    };

    Ok(Some(Comparison {
        best_overall: pick(&scores, Goal::Highest),
        lowest_rate: pick(&rates, Goal::Lowest),
        lowest_monthly_payment: pick(&payments, Goal::Lowest),
        lowest_total_cost: pick(&total_costs, Goal::Lowest),
        most_features: pick(&features, Goal::Highest),
    }))
}

#[derive(Debug, Clone, Copy)]
enum Goal {
    Lowest,
    Highest,
}

/// Index of the best value; the earliest wins a tie. `values` is non-empty.
fn winner_index(values: &[Decimal], goal: Goal) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        let better = match goal {
            Goal::Lowest => *v < values[best],
            Goal::Highest => *v > values[best],
        };
        if better {
            best = i;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Factor comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonFactor {
    InterestRate,
    MonthlyPayment,
    TotalCost,
    Fees,
    Features,
}

impl ComparisonFactor {
    pub const DEFAULTS: [ComparisonFactor; 4] = [
        ComparisonFactor::InterestRate,
        ComparisonFactor::MonthlyPayment,
        ComparisonFactor::TotalCost,
        ComparisonFactor::Fees,
    ];

    fn goal(self) -> Goal {
        match self {
            Self::Features => Goal::Highest,
            _ => Goal::Lowest,
        }
    }

    fn value(self, offer: &Offer) -> OfferAnalyticsResult<Decimal> {
        Ok(match self {
            Self::InterestRate => offer.interest_rate,
            Self::MonthlyPayment => offer.monthly_payment,
            Self::TotalCost => total_cost(offer)?,
            Self::Fees => offer.fees.total(),
            Self::Features => Decimal::from(offer.feature_count()),
        })
    }

    fn savings(self, spread: Decimal) -> String {
        match self {
            Self::InterestRate => format!("Up to {:.2}% difference", spread),
            Self::MonthlyPayment => format!("€{:.2} monthly savings", spread),
            Self::TotalCost => format!("€{} total savings", format_amount(spread)),
            Self::Fees => format!("€{} in fee savings", format_amount(spread)),
            Self::Features => format!("Up to {} more features", spread),
        }
    }
}

impl std::fmt::Display for ComparisonFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InterestRate => "INTEREST_RATE",
            Self::MonthlyPayment => "MONTHLY_PAYMENT",
            Self::TotalCost => "TOTAL_COST",
            Self::Fees => "FEES",
            Self::Features => "FEATURES",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorComparisonInput {
    /// Every offer the borrower holds; the comparison draws from these.
    pub offers: Vec<Offer>,
    /// Offers to compare, in display order.
    pub offer_ids: Vec<String>,
    /// Defaults to rate, payment, total cost and fees.
    #[serde(default)]
    pub factors: Option<Vec<ComparisonFactor>>,
    #[serde(default)]
    pub assumptions: AffordabilityAssumptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorValue {
    pub id: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorResult {
    pub factor: ComparisonFactor,
    pub winner: String,
    pub values: Vec<FactorValue>,
    /// Distance between the best and worst value.
    pub spread: Decimal,
    pub savings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredOffer {
    pub id: String,
    pub analytics: OfferAnalytics,
    pub suitability_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorComparison {
    pub factors: Vec<FactorResult>,
    /// Analytics and scores relative to the compared subset only.
    pub offers: Vec<ScoredOffer>,
}

/// Compare two to five chosen offers factor by factor.
pub fn compare_by_factors(
    input: &FactorComparisonInput,
) -> OfferAnalyticsResult<ComputationOutput<FactorComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.assumptions.validate()?;
    let chosen = select_offers(&input.offers, &input.offer_ids)?;

    let factors: Vec<ComparisonFactor> = match &input.factors {
        Some(f) if !f.is_empty() => f.clone(),
        Some(_) => {
            warnings.push("No comparison factors given; using the defaults".into());
            ComparisonFactor::DEFAULTS.to_vec()
        }
        None => ComparisonFactor::DEFAULTS.to_vec(),
    };

    let mut seen = HashSet::new();
    let results = factors
        .into_iter()
        .filter(|f| seen.insert(*f))
        .map(|factor| compare_factor(factor, &chosen))
        .collect::<OfferAnalyticsResult<Vec<FactorResult>>>()?;

    let offers = chosen
        .iter()
        .map(|o| {
            Ok(ScoredOffer {
                id: o.id.clone(),
                analytics: compute_analytics_with(o, &chosen, &input.assumptions)?,
                suitability_score: compute_suitability_score(o, &chosen)?,
            })
        })
        .collect::<OfferAnalyticsResult<Vec<_>>>()?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Factor-by-factor mortgage offer comparison",
        &serde_json::json!({
            "offer_ids": input.offer_ids,
            "factors": input.factors,
        }),
        warnings,
        elapsed,
        FactorComparison {
            factors: results,
            offers,
        },
    ))
}

fn compare_factor(factor: ComparisonFactor, offers: &[Offer]) -> OfferAnalyticsResult<FactorResult> {
    let values = offers
        .iter()
        .map(|o| factor.value(o))
        .collect::<OfferAnalyticsResult<Vec<Decimal>>>()?;
    let goal = factor.goal();
    let winner = winner_index(&values, goal);
    let loser = winner_index(
        &values,
        match goal {
            Goal::Lowest => Goal::Highest,
            Goal::Highest => Goal::Lowest,
        },
    );
    let spread = (values[loser] - values[winner]).abs();

    Ok(FactorResult {
        factor,
        winner: offers[winner].id.clone(),
        values: offers
            .iter()
            .zip(&values)
            .map(|(o, v)| FactorValue {
                id: o.id.clone(),
                value: *v,
            })
            .collect(),
        spread,
        savings: factor.savings(spread),
    })
}

fn select_offers(offers: &[Offer], ids: &[String]) -> OfferAnalyticsResult<Vec<Offer>> {
    if ids.len() < MIN_COMPARISON_OFFERS {
        return Err(OfferAnalyticsError::EmptyOfferSet {
            operation: "factor comparison".into(),
            required: MIN_COMPARISON_OFFERS,
            actual: ids.len(),
        });
    }
    if ids.len() > MAX_COMPARISON_OFFERS {
        return Err(OfferAnalyticsError::InvalidInput {
            field: "offer_ids".into(),
            reason: format!("At most {MAX_COMPARISON_OFFERS} offers can be compared"),
        });
    }

    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| {
            if !seen.insert(id.as_str()) {
                return Err(OfferAnalyticsError::InvalidInput {
                    field: "offer_ids".into(),
                    reason: format!("Offer {id} listed more than once"),
                });
            }
            let offer = offers
                .iter()
                .find(|o| &o.id == id)
                .ok_or_else(|| OfferAnalyticsError::InvalidInput {
                    field: "offer_ids".into(),
                    reason: format!("Offer {id} not found"),
                })?;
            offer.validate()?;
            Ok(offer.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::offer::fixtures::offer;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_offer_has_no_comparison() {
        assert_eq!(compare_offers(&[offer("a", dec!(3.5))]).unwrap(), None);
        assert_eq!(compare_offers(&[]).unwrap(), None);
    }

    #[test]
    fn test_ties_go_to_first_offer() {
        let all = vec![offer("a", dec!(3.5)), offer("b", dec!(3.5))];
        let c = compare_offers(&all).unwrap().unwrap();
        assert_eq!(c.best_overall.id, "a");
        assert_eq!(c.lowest_rate.id, "a");
        assert_eq!(c.lowest_monthly_payment.id, "a");
        assert_eq!(c.lowest_total_cost.id, "a");
        assert_eq!(c.most_features.id, "a");
    }

    #[test]
    fn test_each_winner_on_its_own_metric() {
        let mut cheap_rate = offer("rate", dec!(3.1));
        cheap_rate.monthly_payment = dec!(1400);
        let mut cheap_payment = offer("payment", dec!(3.6));
        cheap_payment.monthly_payment = dec!(1250);
        cheap_payment.term = 35;
        let mut featured = offer("features", dec!(3.9));
        featured.features = vec!["Cashback".into(), "Offset".into()];

        let all = vec![cheap_rate, cheap_payment, featured];
        let c = compare_offers(&all).unwrap().unwrap();
        assert_eq!(c.lowest_rate.id, "rate");
        assert_eq!(c.lowest_monthly_payment.id, "payment");
        // 1400*360 = 504,000 vs 1250*420 = 525,000 vs 1347.13*360 = 484,967
        assert_eq!(c.lowest_total_cost.id, "features");
        assert_eq!(c.lowest_total_cost.value, dec!(484967));
        assert_eq!(c.most_features.id, "features");
        assert_eq!(c.most_features.value, dec!(2));
    }

    fn factor_input(ids: &[&str]) -> FactorComparisonInput {
        let mut a = offer("a", dec!(3.2));
        a.fees.arrangement_fee = dec!(500);
        let mut b = offer("b", dec!(3.9));
        b.monthly_payment = dec!(1415.5);
        b.fees.arrangement_fee = dec!(2000);
        b.fees.valuation_fee = dec!(150);
        let c = offer("c", dec!(4.4));
        FactorComparisonInput {
            offers: vec![a, b, c],
            offer_ids: ids.iter().map(|s| s.to_string()).collect(),
            factors: None,
            assumptions: AffordabilityAssumptions::default(),
        }
    }

    #[test]
    fn test_factor_comparison_defaults() {
        let out = compare_by_factors(&factor_input(&["b", "a"])).unwrap();
        let r = &out.result;
        assert_eq!(r.factors.len(), 4);

        let rate = &r.factors[0];
        assert_eq!(rate.factor, ComparisonFactor::InterestRate);
        assert_eq!(rate.winner, "a");
        assert_eq!(rate.spread, dec!(0.7));
        assert_eq!(rate.savings, "Up to 0.70% difference");
        assert_eq!(rate.values[0].id, "b");

        let payment = &r.factors[1];
        assert_eq!(payment.winner, "a");
        assert_eq!(payment.savings, "€68.37 monthly savings");

        let fees = &r.factors[3];
        assert_eq!(fees.winner, "a");
        assert_eq!(fees.savings, "€1,650 in fee savings");

        // Scores are relative to the two compared offers only.
        assert_eq!(r.offers[1].analytics.rate_rank, 1);
        assert_eq!(r.offers[0].analytics.rate_rank, 2);
    }

    #[test]
    fn test_factor_comparison_features_goal_is_highest() {
        let mut input = factor_input(&["a", "c"]);
        input.offers[2].features = vec!["Offset".into()];
        input.factors = Some(vec![ComparisonFactor::Features]);
        let out = compare_by_factors(&input).unwrap();
        assert_eq!(out.result.factors[0].winner, "c");
        assert_eq!(out.result.factors[0].savings, "Up to 1 more features");
    }

    #[test]
    fn test_factor_comparison_requires_two_offers() {
        let err = compare_by_factors(&factor_input(&["a"])).unwrap_err();
        assert!(matches!(
            err,
            OfferAnalyticsError::EmptyOfferSet { required: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_factor_comparison_rejects_unknown_and_duplicate_ids() {
        assert!(compare_by_factors(&factor_input(&["a", "zzz"])).is_err());
        assert!(compare_by_factors(&factor_input(&["a", "a"])).is_err());
    }

    #[test]
    fn test_factor_comparison_rejects_more_than_five() {
        let err = compare_by_factors(&factor_input(&["a", "b", "c", "d", "e", "f"])).unwrap_err();
        assert!(matches!(err, OfferAnalyticsError::InvalidInput { .. }));
    }
}
