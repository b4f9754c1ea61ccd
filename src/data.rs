use std::{fmt, sync::OnceLock};

use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::ValueType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::DateTime(dt) => format_datetime(dt),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Int64,
            Value::Float(_) => ValueType::Float64,
            Value::Boolean(_) => ValueType::Boolean,
            Value::DateTime(_) => ValueType::DateTime,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Datetimes at midnight render as plain dates; fractional seconds are kept
/// only when present.
pub fn format_datetime(value: &NaiveDateTime) -> String {
    if value.time() == chrono::NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else if value.nanosecond() != 0 {
        value.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Accepts either a datetime or a bare date (taken as midnight).
pub fn parse_date_like(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(parsed) = parse_naive_datetime(trimmed) {
        return Ok(parsed);
    }
    parse_naive_date(trimmed)
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| anyhow!("Failed to parse '{trimmed}' as date or datetime"))
}

pub fn parse_boolean(value: &str) -> Result<bool> {
    let lowered = value.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        _ => bail!("Failed to parse '{value}' as boolean"),
    }
}

/// Lowercases, strips apostrophes and replaces every non-word character with `_`.
pub fn normalize_column_name(name: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let pattern = NON_WORD.get_or_init(|| Regex::new(r"[^\w]").expect("static pattern compiles"));
    let lowered = name.to_lowercase().replace('\'', "");
    pattern.replace_all(&lowered, "_").into_owned()
}
