use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use offer_analytics_core::time_value::{self, PaymentInput};

use crate::input;

/// Arguments for the annuity payment calculator
#[derive(Args)]
pub struct PaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a percentage (e.g. 3.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in whole years
    #[arg(long, default_value = "30")]
    pub term: u32,
}

pub fn run_payment(args: &PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payment_input: PaymentInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        PaymentInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.term,
        }
    };

    let result = time_value::calculate_payment(&payment_input)?;
    Ok(serde_json::to_value(result)?)
}
