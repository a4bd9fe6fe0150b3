//! The offer record the engine reads, with its fee structure and validity
//! window. Everything here is immutable input; derived figures live in the
//! sibling modules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::OfferAnalyticsError;
use crate::time_value::MAX_TERM_YEARS;
use crate::types::{Money, Percent};
use crate::OfferAnalyticsResult;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Highest rating a lender can carry.
pub const MAX_LENDER_RATING: Decimal = dec!(5);

/// Upper bound on the loan, payment and each fee.
pub const MAX_AMOUNT: Money = dec!(1000000000000);

/// Smallest loan the ratios are computed against.
pub const MIN_LOAN_AMOUNT: Money = Decimal::ONE;

/// Highest annual rate accepted, as a percentage.
pub const MAX_INTEREST_RATE: Percent = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle status recorded against an offer by the surrounding workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
}

/// Up-front fees charged on an offer. Missing entries count as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeStructure {
    #[serde(default)]
    pub arrangement_fee: Money,
    #[serde(default)]
    pub valuation_fee: Money,
    #[serde(default)]
    pub other: Money,
}

impl FeeStructure {
    /// Arrangement plus valuation fee, the figure quoted to borrowers.
    pub fn upfront(&self) -> Money {
        self.arrangement_fee + self.valuation_fee
    }

    /// Every fee including `other`.
    pub fn total(&self) -> Money {
        self.arrangement_fee + self.valuation_fee + self.other
    }
}

/// A mortgage offer made to a single borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub lender_name: String,
    pub product_name: String,
    /// Annual interest rate as a percentage (3.5 = 3.5%).
    pub interest_rate: Percent,
    pub max_loan_amount: Money,
    /// Term in whole years.
    pub term: u32,
    pub monthly_payment: Money,
    /// Loan-to-value as a percentage.
    pub loan_to_value: Percent,
    #[serde(default)]
    pub fees: FeeStructure,
    #[serde(default)]
    pub features: Vec<String>,
    /// Lender rating on a 0–5 scale.
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub decision_in_principle: bool,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OfferStatus>,
}

impl Offer {
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// True once `valid_until` lies strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until < now
    }

    /// Whole days until expiry, rounded up. Negative once expired.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.valid_until - now).num_milliseconds();
        -(-millis).div_euclid(MILLIS_PER_DAY)
    }

    pub fn is_variable_rate(&self) -> bool {
        self.product_name.to_lowercase().contains("variable")
    }

    /// Reject offers that would make the derived ratios meaningless.
    pub fn validate(&self) -> OfferAnalyticsResult<()> {
        if self.max_loan_amount <= Decimal::ZERO {
            return Err(self.invalid("max_loan_amount", "Maximum loan amount must be positive"));
        }
        if self.max_loan_amount < MIN_LOAN_AMOUNT || self.max_loan_amount > MAX_AMOUNT {
            return Err(self.invalid(
                "max_loan_amount",
                &format!("Maximum loan amount must be between {MIN_LOAN_AMOUNT} and {MAX_AMOUNT}"),
            ));
        }
        if self.term == 0 {
            return Err(self.invalid("term", "Term must be at least one year"));
        }
        if self.term > MAX_TERM_YEARS {
            return Err(self.invalid(
                "term",
                &format!("Term cannot exceed {MAX_TERM_YEARS} years"),
            ));
        }
        if self.monthly_payment < Decimal::ZERO {
            return Err(self.invalid("monthly_payment", "Monthly payment cannot be negative"));
        }
        if self.monthly_payment > MAX_AMOUNT {
            return Err(self.invalid(
                "monthly_payment",
                &format!("Monthly payment cannot exceed {MAX_AMOUNT}"),
            ));
        }
        if self.interest_rate < Decimal::ZERO {
            return Err(self.invalid("interest_rate", "Interest rate cannot be negative"));
        }
        if self.interest_rate > MAX_INTEREST_RATE {
            return Err(self.invalid(
                "interest_rate",
                &format!("Interest rate cannot exceed {MAX_INTEREST_RATE}%"),
            ));
        }
        if self.loan_to_value < Decimal::ZERO {
            return Err(self.invalid("loan_to_value", "Loan-to-value cannot be negative"));
        }
        if self.rating < Decimal::ZERO || self.rating > MAX_LENDER_RATING {
            return Err(self.invalid("rating", "Lender rating must be between 0 and 5"));
        }
        let fees = &self.fees;
        if fees.arrangement_fee < Decimal::ZERO
            || fees.valuation_fee < Decimal::ZERO
            || fees.other < Decimal::ZERO
        {
            return Err(self.invalid("fees", "Fees cannot be negative"));
        }
        if fees.arrangement_fee > MAX_AMOUNT
            || fees.valuation_fee > MAX_AMOUNT
            || fees.other > MAX_AMOUNT
        {
            return Err(self.invalid("fees", &format!("Each fee cannot exceed {MAX_AMOUNT}")));
        }
        Ok(())
    }

    pub(crate) fn invalid(&self, field: &str, reason: &str) -> OfferAnalyticsError {
        OfferAnalyticsError::InvalidOffer {
            offer_id: self.id.clone(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    pub fn offer(id: &str, rate: Decimal) -> Offer {
        Offer {
            id: id.into(),
            lender_name: format!("Lender {id}"),
            product_name: "5 Year Fixed".into(),
            interest_rate: rate,
            max_loan_amount: dec!(300000),
            term: 30,
            monthly_payment: dec!(1347.13),
            loan_to_value: dec!(80),
            fees: FeeStructure::default(),
            features: vec![],
            rating: dec!(4),
            decision_in_principle: false,
            valid_until: now() + chrono::Duration::days(60),
            created_at: now() - chrono::Duration::days(3),
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{now, offer};
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fee_totals() {
        let fees = FeeStructure {
            arrangement_fee: dec!(1000),
            valuation_fee: dec!(150),
            other: dec!(50),
        };
        assert_eq!(fees.upfront(), dec!(1150));
        assert_eq!(fees.total(), dec!(1200));
    }

    #[test]
    fn test_days_until_expiry_rounds_up() {
        let mut o = offer("a", dec!(3.5));
        o.valid_until = now() + Duration::hours(36);
        assert_eq!(o.days_until_expiry(now()), 2);

        o.valid_until = now() - Duration::hours(36);
        assert_eq!(o.days_until_expiry(now()), -1);
        assert!(o.is_expired(now()));

        o.valid_until = now();
        assert_eq!(o.days_until_expiry(now()), 0);
        assert!(!o.is_expired(now()));
    }

    #[test]
    fn test_variable_rate_detection_is_case_insensitive() {
        let mut o = offer("a", dec!(4));
        o.product_name = "Standard VARIABLE Rate".into();
        assert!(o.is_variable_rate());
    }

    #[test]
    fn test_validate_rejects_zero_principal_and_term() {
        let mut o = offer("a", dec!(4));
        o.max_loan_amount = Decimal::ZERO;
        assert!(matches!(
            o.validate(),
            Err(OfferAnalyticsError::InvalidOffer { ref field, .. }) if field == "max_loan_amount"
        ));

        let mut o = offer("b", dec!(4));
        o.term = 0;
        assert!(matches!(
            o.validate(),
            Err(OfferAnalyticsError::InvalidOffer { ref field, .. }) if field == "term"
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_magnitudes() {
        let mut o = offer("a", dec!(4));
        o.term = 400_000_000;
        assert!(matches!(
            o.validate(),
            Err(OfferAnalyticsError::InvalidOffer { ref field, .. }) if field == "term"
        ));

        let mut o = offer("b", dec!(28));
        o.max_loan_amount = dec!(100000000000000000000000000);
        o.term = 40;
        assert!(matches!(
            o.validate(),
            Err(OfferAnalyticsError::InvalidOffer { ref field, .. }) if field == "max_loan_amount"
        ));

        let mut o = offer("c", dec!(4));
        o.max_loan_amount = dec!(0.5);
        assert!(o.validate().is_err());

        let mut o = offer("d", dec!(150));
        assert!(matches!(
            o.validate(),
            Err(OfferAnalyticsError::InvalidOffer { ref field, .. }) if field == "interest_rate"
        ));
        o.interest_rate = MAX_INTEREST_RATE;
        assert!(o.validate().is_ok());

        let mut o = offer("e", dec!(4));
        o.term = MAX_TERM_YEARS;
        assert!(o.validate().is_ok());
        o.fees.other = MAX_AMOUNT + Decimal::ONE;
        assert!(o.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_rating_out_of_range() {
        let mut o = offer("a", dec!(4));
        o.rating = dec!(5.5);
        assert!(o.validate().is_err());
    }

    #[test]
    fn test_offer_deserializes_with_defaults() {
        let json = r#"{
            "id": "o1",
            "lender_name": "AIB",
            "product_name": "Green Fixed",
            "interest_rate": 3.45,
            "max_loan_amount": 350000,
            "term": 30,
            "monthly_payment": 1561.9,
            "loan_to_value": 85,
            "valid_until": "2025-04-01T00:00:00Z",
            "created_at": "2025-02-01T00:00:00Z"
        }"#;
        let o: Offer = serde_json::from_str(json).unwrap();
        assert_eq!(o.fees, FeeStructure::default());
        assert!(o.features.is_empty());
        assert!(!o.decision_in_principle);
        assert_eq!(o.status, None);
    }
}
