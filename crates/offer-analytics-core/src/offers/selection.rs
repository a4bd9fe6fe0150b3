//! Filtering and ordering an offer set before it is analysed. Ranking is
//! relative to whatever survives the filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::offer::Offer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    InterestRate,
    MonthlyPayment,
    MaxLoanAmount,
    Term,
    LoanToValue,
    Rating,
    ValidUntil,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferQuery {
    /// Keep offers whose `valid_until` has passed.
    pub include_expired: bool,
    /// Exact lender name to keep.
    pub lender_name: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl OfferQuery {
    pub fn matches(&self, offer: &Offer, now: DateTime<Utc>) -> bool {
        if !self.include_expired && offer.is_expired(now) {
            return false;
        }
        match &self.lender_name {
            Some(lender) => offer.lender_name == *lender,
            None => true,
        }
    }

    /// Filter then stable-sort a copy of `offers`.
    pub fn apply(&self, offers: &[Offer], now: DateTime<Utc>) -> Vec<Offer> {
        let mut selected: Vec<Offer> = offers
            .iter()
            .filter(|o| self.matches(o, now))
            .cloned()
            .collect();

        selected.sort_by(|a, b| {
            let ord = compare_field(self.sort_by, a, b);
            match self.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        selected
    }
}

fn compare_field(field: SortField, a: &Offer, b: &Offer) -> Ordering {
    match field {
        SortField::InterestRate => a.interest_rate.cmp(&b.interest_rate),
        SortField::MonthlyPayment => a.monthly_payment.cmp(&b.monthly_payment),
        SortField::MaxLoanAmount => a.max_loan_amount.cmp(&b.max_loan_amount),
        SortField::Term => a.term.cmp(&b.term),
        SortField::LoanToValue => a.loan_to_value.cmp(&b.loan_to_value),
        SortField::Rating => a.rating.cmp(&b.rating),
        SortField::ValidUntil => a.valid_until.cmp(&b.valid_until),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}
