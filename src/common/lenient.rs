// src/common/lenient.rs

//! Tolerant deserializers for records coming out of the REST backend.
//!
//! Upstream payloads are produced by several endpoints that disagree on
//! shapes: amounts come as numbers or as decimal strings, dates as plain
//! `YYYY-MM-DD` or full timestamps, and any field may be `null` while a
//! fetch is still partial. Everything here degrades to a neutral value
//! instead of failing the whole payload.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Enum types that can be built from an upstream wire code, with `Default`
/// being the "unknown" fallback.
pub trait FromCode: Default {
    fn from_code(code: &str) -> Self;
}

fn value<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null))
}

pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
        _ => None,
    }
}

/// Missing, null or unparseable amounts count as zero.
pub fn amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = value(deserializer)?;
    Ok(decimal_from_value(&raw).unwrap_or(Decimal::ZERO))
}

/// Same as [`amount`] but keeps absence visible, for fields that take part
/// in a fallback chain (`bonAmount || bondAmount`).
pub fn opt_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = value(deserializer)?;
    Ok(decimal_from_value(&raw))
}

pub fn code<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromCode,
{
    match value(deserializer)? {
        Value::String(s) => Ok(T::from_code(s.trim())),
        _ => Ok(T::default()),
    }
}

pub fn opt_code<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromCode,
{
    match value(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(Some(T::from_code(s.trim()))),
        _ => Ok(None),
    }
}

/// Ids and codes are usually strings, but older rows carry numeric ids.
/// Empty strings are treated as absent.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match value(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match value(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

pub fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match value(deserializer)? {
        Value::String(s) => parse_date(&s),
        _ => None,
    })
}

pub fn opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match value(deserializer)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        _ => None,
    })
}

/// Keeps the elements of a JSON array that deserialize as `T` and drops the
/// others. Anything that is not an array yields no records.
pub fn records_from_value<T>(raw: Value, field: &str) -> Vec<T>
where
    T: DeserializeOwned,
{
    let items = match raw {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        other => {
            tracing::debug!(field, kind = json_kind(&other), "expected an array, ignored");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!(field, index, %err, "malformed record skipped");
                None
            }
        })
        .collect()
}

/// `null`, missing arrays and malformed elements never fail the parent.
pub fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(records_from_value(value(deserializer)?, std::any::type_name::<T>()))
}

/// A nested object that is dropped instead of failing the parent.
pub fn opt_record<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match value(deserializer)? {
        Value::Null => None,
        raw => serde_json::from_value(raw)
            .map_err(|err| tracing::debug!(%err, "malformed nested record dropped"))
            .ok(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
