//! Tagged Value Type
//!
//! Every stored value is one of four primitive variants. The variant tag is
//! part of the on-disk representation (`{"type": ..., "value": ...}`) so
//! that recovery is type-preserving: an `Int` written before a crash comes
//! back as an `Int`, not as the string `"42"`.
//!
//! The same type drives the value index: [`Value::to_string`] produces the
//! deterministic textual form used as the index key. Two differently typed
//! values with the same textual form (the string `"true"` and the boolean
//! `true`) share one index entry. That collision is accepted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DbError;

/// A value stored in the database.
///
/// # Example
///
/// ```
/// use redigo::storage::Value;
///
/// assert_eq!(Value::Int(42).to_string(), "42");
/// assert_eq!(Value::Bool(true).to_string(), "true");
/// assert_eq!(Value::Float(2.5).to_string(), "2.5");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// UTF-8 text.
    #[serde(rename = "string")]
    String(String),

    /// 64-bit signed integer.
    #[serde(rename = "int")]
    Int(i64),

    /// Boolean.
    #[serde(rename = "bool")]
    Bool(bool),

    /// 64-bit IEEE-754 float. The on-disk tag is `float64`.
    #[serde(rename = "float64")]
    Float(f64),
}

impl Value {
    /// Decodes a value from an explicit `(type, value)` pair, as found in
    /// command records and snapshot entries.
    ///
    /// The decoder is deliberately lenient about numeric representations:
    /// JSON parsers hand back integers as either integer or float nodes,
    /// and older log files carried integers as strings. An unknown tag is
    /// an [`DbError::UnsupportedValueType`]; a payload that does not match
    /// its tag is a [`DbError::MalformedRecord`].
    pub fn from_tagged(tag: &str, raw: &serde_json::Value) -> Result<Value, DbError> {
        let mismatch = || DbError::MalformedRecord(format!("{tag} payload mismatch: {raw}"));

        match tag {
            "string" => raw
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(mismatch),
            "bool" => raw.as_bool().map(Value::Bool).ok_or_else(mismatch),
            "int" => match raw {
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .map(Value::Int)
                    .ok_or_else(mismatch),
                serde_json::Value::String(s) => {
                    s.parse::<i64>().map(Value::Int).map_err(|_| mismatch())
                }
                _ => Err(mismatch()),
            },
            "float64" => match raw {
                serde_json::Value::Number(n) => {
                    n.as_f64().map(Value::Float).ok_or_else(mismatch)
                }
                serde_json::Value::String(s) => {
                    s.parse::<f64>().map(Value::Float).map_err(|_| mismatch())
                }
                _ => Err(mismatch()),
            },
            other => Err(DbError::UnsupportedValueType(other.to_string())),
        }
    }

    /// Decodes a bare JSON literal (no type tag), as permitted for snapshot
    /// entries. Numbers with a zero fractional part restore as `Int`.
    pub fn from_json_literal(raw: &serde_json::Value) -> Result<Value, DbError> {
        match raw {
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                        Ok(Value::Int(f as i64))
                    } else {
                        Ok(Value::Float(f))
                    }
                } else {
                    Err(DbError::MalformedRecord(format!("unreadable number: {n}")))
                }
            }
            other => Err(DbError::UnsupportedValueType(format!(
                "json {}",
                json_kind(other)
            ))),
        }
    }

    /// Decodes either form: a `{"type": ..., "value": ...}` object or a
    /// bare literal.
    pub fn from_json(raw: &serde_json::Value) -> Result<Value, DbError> {
        if let Some(obj) = raw.as_object() {
            if let Some(tag) = obj.get("type").and_then(|t| t.as_str()) {
                let payload = obj.get("value").unwrap_or(&serde_json::Value::Null);
                return Value::from_tagged(tag, payload);
            }
        }
        Value::from_json_literal(raw)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl fmt::Display for Value {
    /// The deterministic textual form used as the value-index key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            // `{}` on f64 is the shortest decimal that round-trips.
            Value::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
