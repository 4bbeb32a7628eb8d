use crate::domain::model::{BatchFormat, RawRecord};
use crate::utils::error::ParseError;
use std::collections::HashMap;

/// Decodes a batch file into records in source order. Field semantics are
/// left to the normalizer.
pub fn parse_batch(bytes: &[u8], format: BatchFormat) -> Result<Vec<RawRecord>, ParseError> {
    let records = match format {
        BatchFormat::Csv => parse_csv(bytes)?,
        BatchFormat::Json => parse_json(bytes)?,
    };
    tracing::debug!("Parsed {} {} records", records.len(), format);
    Ok(records)
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRecord>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let data: HashMap<String, serde_json::Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value.to_string())))
            .collect();
        records.push(RawRecord { data });
    }

    Ok(records)
}

fn parse_json(bytes: &[u8]) -> Result<Vec<RawRecord>, ParseError> {
    let json_data: serde_json::Value = serde_json::from_slice(bytes)?;

    // a bare array, or an export object carrying the array under `products`
    let items = match json_data {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("products") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(ParseError::NotAnArray),
        },
        _ => return Err(ParseError::NotAnArray),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            serde_json::Value::Object(obj) => Ok(RawRecord {
                data: obj.into_iter().collect(),
            }),
            _ => Err(ParseError::EntryNotObject { index }),
        })
        .collect()
}
