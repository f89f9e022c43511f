//! Decoding of Colibri stats payloads into raw stats.
//!
//! A bridge's `/colibri/stats` endpoint returns a flat JSON object. Values
//! are turned back into the textual form the translator expects: numbers
//! and strings verbatim, booleans as `1`/`0`, numeric arrays in the
//! bracketed histogram encoding. Anything else is dropped.
//!
//! The list form `[{"name": .., "value": ..}]` is accepted as well.

use serde_json::Value;

use crate::error::PayloadError;
use crate::types::RawStat;

/// Decode a JSON stats document.
pub fn stats_from_json(value: Value) -> Result<Vec<RawStat>, PayloadError> {
    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(name, v)| raw_value(&v).map(|value| RawStat { name, value }))
            .collect()),
        Value::Array(items) => items.into_iter().map(stat_from_entry).collect(),
        _ => Err(PayloadError::UnexpectedShape),
    }
}

pub fn stats_from_slice(body: &[u8]) -> Result<Vec<RawStat>, PayloadError> {
    stats_from_json(serde_json::from_slice(body)?)
}

fn stat_from_entry(entry: Value) -> Result<RawStat, PayloadError> {
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .ok_or(PayloadError::UnexpectedShape)?;
    let value = entry
        .get("value")
        .and_then(raw_value)
        .ok_or(PayloadError::UnexpectedShape)?;
    Ok(RawStat::new(name, value))
}

fn raw_value(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        Value::Array(items) => {
            let counts = items
                .iter()
                .map(|item| match item {
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", counts.join(",")))
        }
        Value::Null | Value::Object(_) => None,
    }
}
