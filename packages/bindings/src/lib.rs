use napi::Result as NapiResult;
use napi_derive::napi;

use offer_analytics_core::offers::comparison::{self, FactorComparisonInput};
use offer_analytics_core::offers::engine::{self, AffordabilityInput, OfferSetInput};
use offer_analytics_core::offers::record::{self, OfferRecord};
use offer_analytics_core::time_value::{self, PaymentInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Offer sets
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_offers(input_json: String) -> NapiResult<String> {
    let input: OfferSetInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::analyze_offers(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_offers_by_factors(input_json: String) -> NapiResult<String> {
    let input: FactorComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::compare_by_factors(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Stored rows (fees and features as JSON text) to engine offers.
#[napi]
pub fn decode_offer_records(records_json: String) -> NapiResult<String> {
    let records: Vec<OfferRecord> = serde_json::from_str(&records_json).map_err(to_napi_error)?;
    let offers = record::decode_records(records).map_err(to_napi_error)?;
    serde_json::to_string(&offers).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Single offer
// ---------------------------------------------------------------------------

#[napi]
pub fn offer_affordability(input_json: String) -> NapiResult<String> {
    let input: AffordabilityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::assess_affordability(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn monthly_payment(input_json: String) -> NapiResult<String> {
    let input: PaymentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = time_value::calculate_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
