//! Whole-set analysis: select, enrich every offer, then compare and
//! summarise. This is the entry point the CLI and bindings call.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::affordability::{compute_affordability_with, AffordabilityAssumptions, AffordabilityMetrics};
use super::analytics::{compute_analytics_with, OfferAnalytics};
use super::comparison::{compare_offers, Comparison};
use super::market::{market_comparison, overall_recommendations, MarketComparison};
use super::narrative::{generate_narrative_with, time_ago};
use super::offer::Offer;
use super::scoring::{classify_competitiveness, score_breakdown, Competitiveness, ScoreBreakdown};
use super::selection::OfferQuery;
use super::summary::{summarize, OfferSummary};
use crate::time_value::monthly_payment;
use crate::types::{with_metadata, ComputationOutput};
use crate::OfferAnalyticsResult;

/// Relative gap between quoted and annuity payment worth flagging.
const PAYMENT_MISMATCH_TOLERANCE: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferSetInput {
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub query: OfferQuery,
    /// Reference time for expiry; defaults to the current time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assumptions: AffordabilityAssumptions,
}

/// An offer with everything derived for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedOffer {
    #[serde(flatten)]
    pub offer: Offer,
    pub analytics: OfferAnalytics,
    pub affordability: AffordabilityMetrics,
    pub suitability_score: u32,
    pub score_breakdown: ScoreBreakdown,
    pub competitiveness: Competitiveness,
    pub time_ago: String,
    pub is_expired: bool,
    pub days_until_expiry: i64,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferSetAnalysis {
    pub offers: Vec<EnhancedOffer>,
    pub market_data: Option<MarketComparison>,
    pub comparison: Option<Comparison>,
    pub recommendations: Vec<String>,
    pub summary: OfferSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    pub offer: Offer,
    #[serde(default)]
    pub assumptions: AffordabilityAssumptions,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyse a borrower's offers end to end.
pub fn analyze_offers(
    input: &OfferSetInput,
) -> OfferAnalyticsResult<ComputationOutput<OfferSetAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.assumptions.validate()?;
    let now = input.as_of.unwrap_or_else(Utc::now);

    let offers = input.query.apply(&input.offers, now);
    debug!(
        received = input.offers.len(),
        selected = offers.len(),
        "analysing mortgage offer set"
    );

    if offers.is_empty() && !input.offers.is_empty() {
        warnings.push(format!(
            "None of the {} offers matched the query",
            input.offers.len()
        ));
    }

    let enhanced = offers
        .iter()
        .map(|offer| {
            collect_offer_warnings(offer, now, &mut warnings)?;
            enhance(offer, &offers, now, &input.assumptions)
        })
        .collect::<OfferAnalyticsResult<Vec<_>>>()?;

    let market_data = if offers.is_empty() {
        None
    } else {
        Some(market_comparison(&offers)?)
    };
    let comparison = compare_offers(&offers)?;
    let recommendations = overall_recommendations(&offers, market_data.as_ref(), now)?;
    let summary = summarize(&offers, now)?;

    for w in &warnings {
        warn!("{w}");
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Mortgage offer analytics: payment-derived cost, rank-relative suitability scoring, +2pt stress test",
        input,
        warnings,
        elapsed,
        OfferSetAnalysis {
            offers: enhanced,
            market_data,
            comparison,
            recommendations,
            summary,
        },
    ))
}

/// Stress test a single offer.
pub fn assess_affordability(
    input: &AffordabilityInput,
) -> OfferAnalyticsResult<ComputationOutput<AffordabilityMetrics>> {
    let start = Instant::now();
    input.assumptions.validate()?;

    let mut warnings = Vec::new();
    if input.offer.monthly_payment.is_zero() {
        warnings.push("Monthly payment is zero; income-based ratios are not meaningful".into());
    }
    let metrics = compute_affordability_with(&input.offer, &input.assumptions)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Affordability stress test at offer rate plus shock",
        input,
        warnings,
        elapsed,
        metrics,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn enhance(
    offer: &Offer,
    all_offers: &[Offer],
    now: DateTime<Utc>,
    assumptions: &AffordabilityAssumptions,
) -> OfferAnalyticsResult<EnhancedOffer> {
    let analytics = compute_analytics_with(offer, all_offers, assumptions)?;
    let affordability = compute_affordability_with(offer, assumptions)?;
    let breakdown = score_breakdown(offer, all_offers)?;
    let score = breakdown.score();
    let narrative = generate_narrative_with(offer, all_offers, now, assumptions)?;

    Ok(EnhancedOffer {
        offer: offer.clone(),
        analytics,
        affordability,
        suitability_score: score,
        score_breakdown: breakdown,
        competitiveness: classify_competitiveness(score),
        time_ago: time_ago(offer.created_at, now),
        is_expired: offer.is_expired(now),
        days_until_expiry: offer.days_until_expiry(now),
        pros: narrative.pros,
        cons: narrative.cons,
        risk_factors: narrative.risks,
        recommendations: narrative.recommendations,
    })
}

fn collect_offer_warnings(
    offer: &Offer,
    now: DateTime<Utc>,
    warnings: &mut Vec<String>,
) -> OfferAnalyticsResult<()> {
    offer.validate()?;

    if offer.is_expired(now) {
        warnings.push(format!("Offer {} expired on {}", offer.id, offer.valid_until.date_naive()));
    }
    if offer.monthly_payment.is_zero() {
        warnings.push(format!(
            "Offer {} has a zero monthly payment; income-based ratios are not meaningful",
            offer.id
        ));
        return Ok(());
    }

    // Total interest is taken from the quoted payment, so a payment that
    // disagrees with the annuity formula skews the effective rate.
    let annuity = monthly_payment(offer.max_loan_amount, offer.interest_rate, offer.term)
        .map_err(|e| offer.invalid("interest_rate", &e.to_string()))?;
    if !annuity.is_zero() {
        let gap = ((offer.monthly_payment - annuity) / annuity).abs();
        if gap > PAYMENT_MISMATCH_TOLERANCE {
            warnings.push(format!(
                "Offer {} quotes {} per month but the annuity payment is {}; effective rate reflects the quoted payment",
                offer.id,
                offer.monthly_payment.normalize(),
                annuity.round_dp(2)
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::offer::fixtures::{now, offer};
    use crate::offers::selection::SortField;
    use chrono::Duration;

    fn input(offers: Vec<Offer>) -> OfferSetInput {
        OfferSetInput {
            offers,
            query: OfferQuery::default(),
            as_of: Some(now()),
            assumptions: AffordabilityAssumptions::default(),
        }
    }

    #[test]
    fn test_analyze_empty_set() {
        let out = analyze_offers(&input(vec![])).unwrap();
        let r = &out.result;
        assert!(r.offers.is_empty());
        assert!(r.market_data.is_none());
        assert!(r.comparison.is_none());
        assert_eq!(r.summary, OfferSummary::default());
        assert_eq!(r.recommendations.len(), 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_analyze_filters_before_ranking() {
        let mut expired = offer("old", dec!(2.9));
        expired.valid_until = now() - Duration::days(1);
        let out = analyze_offers(&input(vec![
            offer("a", dec!(3.8)),
            expired,
            offer("b", dec!(3.4)),
        ]))
        .unwrap();
        let r = &out.result;

        let ids: Vec<&str> = r.offers.iter().map(|e| e.offer.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        // The expired 2.9% offer is not part of the ranking.
        assert_eq!(r.offers[0].analytics.rate_rank, 1);
        assert_eq!(r.summary.total, 2);
        assert_eq!(r.comparison.as_ref().unwrap().lowest_rate.id, "b");
    }

    #[test]
    fn test_analyze_enhanced_offer_fields() {
        let out = analyze_offers(&input(vec![offer("a", dec!(3.5))])).unwrap();
        let e = &out.result.offers[0];
        assert_eq!(e.time_ago, "3 days ago");
        assert!(!e.is_expired);
        assert_eq!(e.days_until_expiry, 60);
        assert_eq!(e.suitability_score, e.score_breakdown.score());
        assert_eq!(e.competitiveness, classify_competitiveness(e.suitability_score));
        assert_eq!(e.analytics.total_cost, dec!(484967));
    }

    #[test]
    fn test_analyze_flags_payment_mismatch() {
        let mut o = offer("a", dec!(3.5));
        o.monthly_payment = dec!(1000);
        let out = analyze_offers(&input(vec![o])).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("annuity payment is 1347.13"));
    }

    #[test]
    fn test_analyze_warns_when_query_matches_nothing() {
        let mut i = input(vec![offer("a", dec!(3.5))]);
        i.query.lender_name = Some("Nobody".into());
        i.query.sort_by = SortField::Rating;
        let out = analyze_offers(&i).unwrap();
        assert!(out.result.offers.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_analyze_rejects_invalid_offer() {
        let mut o = offer("a", dec!(3.5));
        o.term = 0;
        assert!(analyze_offers(&input(vec![o])).is_err());
    }

    #[test]
    fn test_assess_affordability_envelope() {
        let out = assess_affordability(&AffordabilityInput {
            offer: offer("a", dec!(3.5)),
            assumptions: AffordabilityAssumptions::default(),
        })
        .unwrap();
        assert_eq!(out.result.stress_test_payment, dec!(1703));
        assert!(out.warnings.is_empty());
    }
}
