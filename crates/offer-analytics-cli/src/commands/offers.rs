use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use offer_analytics_core::offers::affordability::AffordabilityAssumptions;
use offer_analytics_core::offers::comparison::{
    self, ComparisonFactor, FactorComparisonInput,
};
use offer_analytics_core::offers::engine::{self, AffordabilityInput, OfferSetInput};
use offer_analytics_core::offers::record::{decode_records, OfferRecord};
use offer_analytics_core::offers::selection::{SortField, SortOrder};

use crate::input;

/// Arguments for whole-set offer analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON input file (an offer array or {"offers": [...], ...})
    #[arg(long)]
    pub input: Option<String>,

    /// Offers are stored records with JSON-encoded fees and features
    #[arg(long)]
    pub records: bool,

    /// Keep offers whose validity has lapsed
    #[arg(long)]
    pub include_expired: bool,

    /// Only analyse offers from this lender
    #[arg(long)]
    pub lender: Option<String>,

    /// Field to order offers by
    #[arg(long, value_enum)]
    pub sort_by: Option<SortByArg>,

    /// Sort direction
    #[arg(long, value_enum)]
    pub sort_order: Option<SortOrderArg>,

    /// Reference time for expiry (RFC 3339), defaults to now
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,
}

/// Arguments for factor-by-factor comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file with the offer set
    #[arg(long)]
    pub input: Option<String>,

    /// Offers are stored records with JSON-encoded fees and features
    #[arg(long)]
    pub records: bool,

    /// Offer ids to compare (comma-separated, 2-5)
    #[arg(long, value_delimiter = ',')]
    pub offer_ids: Option<Vec<String>>,

    /// Factors to compare on (comma-separated)
    #[arg(long, value_delimiter = ',', value_enum)]
    pub factors: Option<Vec<FactorArg>>,
}

/// Arguments for a single-offer stress test
#[derive(Args)]
pub struct AffordabilityArgs {
    /// Path to JSON input file (an offer or {"offer": {...}, "assumptions": {...}})
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortByArg {
    InterestRate,
    MonthlyPayment,
    MaxLoanAmount,
    Term,
    LoanToValue,
    Rating,
    ValidUntil,
    CreatedAt,
}

impl From<SortByArg> for SortField {
    fn from(arg: SortByArg) -> Self {
        match arg {
            SortByArg::InterestRate => SortField::InterestRate,
            SortByArg::MonthlyPayment => SortField::MonthlyPayment,
            SortByArg::MaxLoanAmount => SortField::MaxLoanAmount,
            SortByArg::Term => SortField::Term,
            SortByArg::LoanToValue => SortField::LoanToValue,
            SortByArg::Rating => SortField::Rating,
            SortByArg::ValidUntil => SortField::ValidUntil,
            SortByArg::CreatedAt => SortField::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortOrderArg {
    Asc,
    Desc,
}

impl From<SortOrderArg> for SortOrder {
    fn from(arg: SortOrderArg) -> Self {
        match arg {
            SortOrderArg::Asc => SortOrder::Asc,
            SortOrderArg::Desc => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FactorArg {
    InterestRate,
    MonthlyPayment,
    TotalCost,
    Fees,
    Features,
}

impl From<FactorArg> for ComparisonFactor {
    fn from(arg: FactorArg) -> Self {
        match arg {
            FactorArg::InterestRate => ComparisonFactor::InterestRate,
            FactorArg::MonthlyPayment => ComparisonFactor::MonthlyPayment,
            FactorArg::TotalCost => ComparisonFactor::TotalCost,
            FactorArg::Fees => ComparisonFactor::Fees,
            FactorArg::Features => ComparisonFactor::Features,
        }
    }
}

pub fn run_analyze(
    args: &AnalyzeArgs,
    assumptions: Option<AffordabilityAssumptions>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let value = offer_set_value(read_input(&args.input, "offer analysis")?, args.records)?;
    let mut set: OfferSetInput = serde_json::from_value(value)?;

    if args.include_expired {
        set.query.include_expired = true;
    }
    if let Some(ref lender) = args.lender {
        set.query.lender_name = Some(lender.clone());
    }
    if let Some(sort_by) = args.sort_by {
        set.query.sort_by = sort_by.into();
    }
    if let Some(order) = args.sort_order {
        set.query.sort_order = order.into();
    }
    if args.as_of.is_some() {
        set.as_of = args.as_of;
    }
    if let Some(a) = assumptions {
        set.assumptions = a;
    }

    let result = engine::analyze_offers(&set)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(
    args: &CompareArgs,
    assumptions: Option<AffordabilityAssumptions>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut value = offer_set_value(read_input(&args.input, "offer comparison")?, args.records)?;
    if value.get("offer_ids").is_none() {
        value["offer_ids"] = json!([]);
    }
    let mut cmp: FactorComparisonInput = serde_json::from_value(value)?;

    if let Some(ref ids) = args.offer_ids {
        cmp.offer_ids = ids.clone();
    }
    if let Some(ref factors) = args.factors {
        cmp.factors = Some(factors.iter().copied().map(Into::into).collect());
    }
    if let Some(a) = assumptions {
        cmp.assumptions = a;
    }
    if cmp.offer_ids.is_empty() {
        return Err("--offer-ids <a,b,...> or an \"offer_ids\" array is required".into());
    }

    let result = comparison::compare_by_factors(&cmp)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_affordability(
    args: &AffordabilityArgs,
    assumptions: Option<AffordabilityAssumptions>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut value = read_input(&args.input, "affordability")?;
    if value.get("offer").is_none() {
        value = json!({ "offer": value });
    }
    let mut aff: AffordabilityInput = serde_json::from_value(value)?;
    if let Some(a) = assumptions {
        aff.assumptions = a;
    }

    let result = engine::assess_affordability(&aff)?;
    Ok(serde_json::to_value(result)?)
}

fn read_input(path: &Option<String>, what: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref path) = path {
        input::file::read_document(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}

/// Normalise to `{"offers": [...]}`, decoding stored records when asked.
fn offer_set_value(value: Value, records: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let mut value = if value.is_array() {
        json!({ "offers": value })
    } else {
        value
    };
    if !value.is_object() {
        return Err("expected an offer array or an object with an \"offers\" array".into());
    }

    if records {
        let raw = value
            .get_mut("offers")
            .map(Value::take)
            .ok_or("input has no \"offers\" array")?;
        let records: Vec<OfferRecord> = serde_json::from_value(raw)?;
        value["offers"] = serde_json::to_value(decode_records(records)?)?;
    }
    Ok(value)
}
