use std::str::FromStr;

use workflow::material::MaterialName;
use workflow::source::SourceNumber;

/// Parse a `<material>=<value>` pair, e.g. 'Zr=10'.
pub fn material_value_parser(s: &str) -> Result<(MaterialName, u32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Missing value in '{}'", s))?;

    let material = MaterialName::from_str(key.trim()).map_err(|e| format!("Invalid material '{}': {}", key, e))?;
    let value = value
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("Invalid number '{}': {}", value, e))?;

    Ok((material, value))
}

/// Parse a 1-based source number, e.g. '3'.
pub fn source_number_parser(s: &str) -> Result<SourceNumber, String> {
    SourceNumber::from_str(s).map_err(|e| e.to_string())
}
