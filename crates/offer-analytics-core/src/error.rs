use thiserror::Error;

#[derive(Debug, Error)]
pub enum OfferAnalyticsError {
    #[error("Invalid offer {offer_id}: {field} — {reason}")]
    InvalidOffer {
        offer_id: String,
        field: String,
        reason: String,
    },

    #[error("{operation} requires at least {required} offer(s), got {actual}")]
    EmptyOfferSet {
        operation: String,
        required: usize,
        actual: usize,
    },

    #[error("Malformed fee data on offer {offer_id}: {reason}")]
    MalformedFeeData { offer_id: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for OfferAnalyticsError {
    fn from(e: serde_json::Error) -> Self {
        OfferAnalyticsError::SerializationError(e.to_string())
    }
}
