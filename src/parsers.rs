//! Value parsers for use with the `copy` rule.
//!
//! Any `Fn(&Value) -> Result<Value>` is a `Parser`. The built-ins below are also available as
//! `NamedParser`s so that they can be stored within serialized mappings.
use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

pub trait Parser: Send + Sync {
    fn parse(&self, value: &Value) -> Result<Value>;
}

impl<F> Parser for F
where
    F: Fn(&Value) -> Result<Value> + Send + Sync,
{
    #[inline]
    fn parse(&self, value: &Value) -> Result<Value> {
        self(value)
    }
}

/// NamedParser is a parser that can be serialized along with the mapping that uses it.
#[typetag::serde(tag = "type")]
pub trait NamedParser: Debug + Send + Sync {
    fn parse(&self, value: &Value) -> Result<Value>;
}

/// parses a date, accepting RFC 3339 timestamps, plain `YYYY-MM-DD` dates and
/// `YYYY-MM-DDTHH:MM:SS` timestamps. Dates and timestamps without an offset are taken as UTC.
pub fn parse_date(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(DateTime::from_naive_utc_and_offset(dt, Utc));
    }
    let midnight = NaiveDate::parse_from_str(text, "%Y-%m-%d")?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::Parse(format!("{} has no midnight", text)))?;
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}

/// parses a string into a date and writes it back the way a JSON date serializes,
/// eg. `2020-12-25T00:00:00.000Z`.
pub fn to_date(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(
            parse_date(s)?.to_rfc3339_opts(SecondsFormat::Millis, true),
        )),
        v => Err(Error::Parse(format!("expected a date string, found {}", v))),
    }
}

/// parses strings and numbers into integers; fractional numbers are truncated.
pub fn to_int(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::from(s.trim().parse::<i64>()?)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::from(i)),
            None => match n.as_f64().map(f64::trunc) {
                Some(f) if f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(Value::from(f as i64)),
                _ => Err(Error::Parse(format!("{} is out of range for an integer", n))),
            },
        },
        v => Err(Error::Parse(format!("expected an integer, found {}", v))),
    }
}

pub fn to_float(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::from(s.trim().parse::<f64>()?)),
        Value::Number(n) => n
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| Error::Parse(format!("{} is not a float", n))),
        v => Err(Error::Parse(format!("expected a float, found {}", v))),
    }
}

/// trims surrounding whitespace from strings, other values pass through untouched.
pub fn trim(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(s.trim().to_string())),
        v => Ok(v.clone()),
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ToInt {}

#[typetag::serde(name = "int")]
impl NamedParser for ToInt {
    fn parse(&self, value: &Value) -> Result<Value> {
        to_int(value)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ToFloat {}

#[typetag::serde(name = "float")]
impl NamedParser for ToFloat {
    fn parse(&self, value: &Value) -> Result<Value> {
        to_float(value)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ToDate {}

#[typetag::serde(name = "date")]
impl NamedParser for ToDate {
    fn parse(&self, value: &Value) -> Result<Value> {
        to_date(value)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Trim {}

#[typetag::serde(name = "trim")]
impl NamedParser for Trim {
    fn parse(&self, value: &Value) -> Result<Value> {
        trim(value)
    }
}
