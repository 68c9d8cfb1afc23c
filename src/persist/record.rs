//! Command Records
//!
//! One [`CommandRecord`] is written to the append-only log for every
//! mutation. Records are line-delimited JSON:
//!
//! ```text
//! {"name":"SET","key":"a","value":{"type":"int","value":1},"ttl":0,"timestamp":1700000000}
//! {"name":"DELETE","key":"a","value":{},"timestamp":1700000001}
//! {"name":"EXPIRE","key":"b","value":{"type":"float64","value":30.0},"timestamp":1700000002}
//! ```
//!
//! `timestamp` is the logical time the mutation was applied and anchors TTL
//! semantics during replay: a SET's `ttl` is relative to its timestamp, so
//! the absolute deadline (`timestamp + ttl`) survives a restart unchanged.
//! EXPIRE likewise carries relative seconds, re-anchored at replay.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::storage::Value;

/// Wall-clock seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// The mutation kind a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "SET")]
    Set,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "EXPIRE")]
    Expire,
}

/// One journaled mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub name: CommandName,
    pub key: String,

    /// SET carries the stored value, EXPIRE the relative seconds as a
    /// float64, DELETE an empty object.
    #[serde(with = "record_value", default)]
    pub value: Option<Value>,

    /// Relative TTL in seconds, present only on SET. 0 means no expiry.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ttl: Option<i64>,

    /// Seconds since the Unix epoch at apply time.
    pub timestamp: i64,
}

impl CommandRecord {
    pub fn set(key: &str, value: Value, ttl: i64, timestamp: i64) -> Self {
        Self {
            name: CommandName::Set,
            key: key.to_string(),
            value: Some(value),
            ttl: Some(ttl),
            timestamp,
        }
    }

    pub fn delete(key: &str, timestamp: i64) -> Self {
        Self {
            name: CommandName::Delete,
            key: key.to_string(),
            value: None,
            ttl: None,
            timestamp,
        }
    }

    pub fn expire(key: &str, seconds: i64, timestamp: i64) -> Self {
        Self {
            name: CommandName::Expire,
            key: key.to_string(),
            value: Some(Value::Float(seconds as f64)),
            ttl: None,
            timestamp,
        }
    }

    /// The relative seconds carried by an EXPIRE record.
    pub fn expire_seconds(&self) -> Option<i64> {
        match &self.value {
            Some(Value::Float(f)) => Some(*f as i64),
            Some(Value::Int(i)) => Some(*i),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Serde for the `value` field: DELETE records write an empty object, and
/// decoding tolerates the lenient numeric forms accepted by
/// [`Value::from_json`].
mod record_value {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value as Json;

    use crate::storage::Value;

    pub fn serialize<S: Serializer>(value: &Option<Value>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => v.serialize(ser),
            None => serde_json::Map::new().serialize(ser),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Value>, D::Error> {
        let raw = Json::deserialize(de)?;
        match &raw {
            Json::Null => Ok(None),
            Json::Object(obj) if obj.is_empty() => Ok(None),
            // An object with an empty type tag is a DELETE placeholder.
            Json::Object(obj)
                if obj.get("type").and_then(|t| t.as_str()) == Some("") =>
            {
                Ok(None)
            }
            _ => Value::from_json(&raw)
                .map(Some)
                .map_err(|e| D::Error::custom(e.to_string())),
        }
    }
}
