//! Stored offer rows keep `fees` and `features` as JSON-encoded strings.
//! They are decoded here, once, so the engine only ever sees typed data.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::offer::{FeeStructure, Offer, OfferStatus};
use crate::error::OfferAnalyticsError;
use crate::types::{Money, Percent};
use crate::OfferAnalyticsResult;

/// An offer as persisted by the surrounding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRecord {
    pub id: String,
    pub lender_name: String,
    pub product_name: String,
    pub interest_rate: Percent,
    pub max_loan_amount: Money,
    pub term: u32,
    pub monthly_payment: Money,
    pub loan_to_value: Percent,
    /// JSON object, e.g. `{"arrangementFee":1000,"valuationFee":150}`.
    #[serde(default)]
    pub fees: Option<String>,
    /// JSON array of feature names.
    #[serde(default)]
    pub features: Option<String>,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub decision_in_principle: bool,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<OfferStatus>,
}

/// Fee JSON as written by the web application (camelCase keys).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFees {
    #[serde(default)]
    arrangement_fee: Option<Money>,
    #[serde(default)]
    valuation_fee: Option<Money>,
    #[serde(default)]
    other: Option<Money>,
}

impl OfferRecord {
    /// Decode the embedded JSON and produce a validated [`Offer`].
    pub fn into_offer(self) -> OfferAnalyticsResult<Offer> {
        let fees = parse_fees(&self.id, self.fees.as_deref())?;
        let features = parse_features(&self.id, self.features.as_deref())?;

        let offer = Offer {
            id: self.id,
            lender_name: self.lender_name,
            product_name: self.product_name,
            interest_rate: self.interest_rate,
            max_loan_amount: self.max_loan_amount,
            term: self.term,
            monthly_payment: self.monthly_payment,
            loan_to_value: self.loan_to_value,
            fees,
            features,
            rating: self.rating.unwrap_or(Decimal::ZERO),
            decision_in_principle: self.decision_in_principle,
            valid_until: self.valid_until,
            created_at: self.created_at,
            status: self.status,
        };
        offer.validate()?;
        Ok(offer)
    }
}

/// Convert a batch of records, stopping at the first defective one.
pub fn decode_records(records: Vec<OfferRecord>) -> OfferAnalyticsResult<Vec<Offer>> {
    records.into_iter().map(OfferRecord::into_offer).collect()
}

fn parse_fees(offer_id: &str, raw: Option<&str>) -> OfferAnalyticsResult<FeeStructure> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(FeeStructure::default());
    };

    let stored: StoredFees =
        serde_json::from_str(raw).map_err(|e| OfferAnalyticsError::MalformedFeeData {
            offer_id: offer_id.to_string(),
            reason: format!("fees: {e}"),
        })?;

    Ok(FeeStructure {
        arrangement_fee: stored.arrangement_fee.unwrap_or_default(),
        valuation_fee: stored.valuation_fee.unwrap_or_default(),
        other: stored.other.unwrap_or_default(),
    })
}

fn parse_features(offer_id: &str, raw: Option<&str>) -> OfferAnalyticsResult<Vec<String>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };

    serde_json::from_str(raw).map_err(|e| OfferAnalyticsError::MalformedFeeData {
        offer_id: offer_id.to_string(),
        reason: format!("features: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(fees: Option<&str>, features: Option<&str>) -> OfferRecord {
        OfferRecord {
            id: "rec-1".into(),
            lender_name: "Bank of Ireland".into(),
            product_name: "4 Year Fixed".into(),
            interest_rate: dec!(3.9),
            max_loan_amount: dec!(320000),
            term: 30,
            monthly_payment: dec!(1509.4),
            loan_to_value: dec!(88),
            fees: fees.map(String::from),
            features: features.map(String::from),
            rating: Some(dec!(4.2)),
            decision_in_principle: true,
            valid_until: "2025-05-01T00:00:00Z".parse().unwrap(),
            created_at: "2025-02-01T00:00:00Z".parse().unwrap(),
            status: Some(OfferStatus::Pending),
        }
    }

    #[test]
    fn test_record_decodes_fee_and_feature_json() {
        let offer = record(
            Some(r#"{"arrangementFee": 1000, "valuationFee": 185}"#),
            Some(r#"["Cashback", "Overpayments"]"#),
        )
        .into_offer()
        .unwrap();

        assert_eq!(offer.fees.arrangement_fee, dec!(1000));
        assert_eq!(offer.fees.valuation_fee, dec!(185));
        assert_eq!(offer.fees.other, Decimal::ZERO);
        assert_eq!(offer.features, vec!["Cashback", "Overpayments"]);
    }

    #[test]
    fn test_record_missing_json_defaults_to_empty() {
        let offer = record(None, Some("  ")).into_offer().unwrap();
        assert_eq!(offer.fees, FeeStructure::default());
        assert!(offer.features.is_empty());
    }

    #[test]
    fn test_record_malformed_fees_rejected() {
        let err = record(Some("{arrangementFee: 1000"), None)
            .into_offer()
            .unwrap_err();
        assert!(matches!(err, OfferAnalyticsError::MalformedFeeData { .. }));
    }

    #[test]
    fn test_record_malformed_features_rejected() {
        let err = record(None, Some(r#"{"not": "a list"}"#))
            .into_offer()
            .unwrap_err();
        match err {
            OfferAnalyticsError::MalformedFeeData { offer_id, reason } => {
                assert_eq!(offer_id, "rec-1");
                assert!(reason.starts_with("features"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_record_validation_runs_after_decoding() {
        let mut r = record(None, None);
        r.max_loan_amount = Decimal::ZERO;
        assert!(matches!(
            r.into_offer(),
            Err(OfferAnalyticsError::InvalidOffer { .. })
        ));
    }
}
