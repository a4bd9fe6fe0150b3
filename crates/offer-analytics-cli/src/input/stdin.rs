use serde_json::Value;
use std::io::{self, Read};

use super::file::DocumentFormat;

/// Read a piped offer document. JSON is tried first, then YAML.
/// Returns None for an interactive terminal or empty input.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match DocumentFormat::Json.parse(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => DocumentFormat::Yaml
            .parse(trimmed)
            .map(Some)
            .map_err(|_| format!("stdin is neither JSON nor YAML: {json_err}").into()),
    }
}
