pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Columns shown per offer in tabular output, as dotted paths into the
/// enhanced offer.
const OFFER_COLUMNS: [(&str, &str); 10] = [
    ("id", "id"),
    ("lender", "lender_name"),
    ("product", "product_name"),
    ("rate", "interest_rate"),
    ("monthly", "monthly_payment"),
    ("total_cost", "analytics.total_cost"),
    ("rank", "analytics.rate_rank"),
    ("score", "suitability_score"),
    ("label", "competitiveness"),
    ("risk", "affordability.risk_level"),
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Header and one row per offer when the result is an analysed offer set.
fn offer_rows(result: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let offers = result.get("offers")?.as_array()?;
    if !offers.iter().all(|o| o.get("suitability_score").is_some()) {
        return None;
    }

    let headers = OFFER_COLUMNS.iter().map(|(h, _)| h.to_string()).collect();
    let rows = offers
        .iter()
        .map(|offer| {
            OFFER_COLUMNS
                .iter()
                .map(|(_, path)| lookup(offer, path).map(scalar).unwrap_or_default())
                .collect()
        })
        .collect();
    Some((headers, rows))
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
