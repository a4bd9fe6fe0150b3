//! Mortgage offer analytics.
//!
//! Scores, stress-tests and compares the mortgage offers held by a single
//! borrower. Every operation is a pure function of the offer set passed in;
//! nothing is cached, so results must be recomputed whenever the set changes.

pub mod error;
pub mod offers;
pub mod time_value;
pub mod types;

pub use error::OfferAnalyticsError;
pub use types::*;

/// Standard result type for all offer analytics operations
pub type OfferAnalyticsResult<T> = Result<T, OfferAnalyticsError>;
