//! # Row Decoding
//!
//! Query results are returned as associative rows: column name to JSON value.
//! Decoding tries integer, float, text, boolean and blob in that order and
//! maps SQL `NULL` to [`serde_json::Value::Null`].

use serde_json::{Map, Value};
use sqlx::{Column, Row as _, any::AnyRow};

/// One result row keyed by column name.
pub type Row = Map<String, Value>;

pub(crate) fn decode_row(row: &AnyRow) -> Result<Row, sqlx::Error> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        decoded.insert(column.name().to_string(), decode_value(row, index)?);
    }
    Ok(decoded)
}

pub(crate) fn decode_rows(rows: &[AnyRow]) -> Result<Vec<Row>, sqlx::Error> {
    rows.iter().map(decode_row).collect()
}

fn decode_value(row: &AnyRow, index: usize) -> Result<Value, sqlx::Error> {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return Ok(value.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return Ok(value.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return Ok(value.map(Value::from).unwrap_or(Value::Null));
    }
    let bytes = row.try_get::<Option<Vec<u8>>, _>(index)?;
    Ok(bytes.map(|b| Value::String(String::from_utf8_lossy(&b).into_owned())).unwrap_or(Value::Null))
}
