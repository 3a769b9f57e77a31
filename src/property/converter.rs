//! Bidirectional converters between the wire, typed and store forms.

use chrono::{DateTime, Utc};

use crate::model::Value;
use crate::storage::Store;
use crate::{Error, Result};
use super::{EndpointConverter, ValueType};

/// Bidirectional mapping between representations `A` and `B`.
///
/// Store converters map typed → store (`convert`) and store → typed
/// (`revert`). Input converters map wire → typed and typed → wire.
pub trait PropertyConverter<A, B> {
    fn convert(&self, source: A) -> Result<B>;
    fn revert(&self, target: B) -> Result<A>;
}

fn mismatch(key: &str, value: impl std::fmt::Display, expected: ValueType) -> Error {
    Error::Conversion {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

// ============================================================================
// Store side: scalars
// ============================================================================

/// Typed ↔ store conversion for scalar kinds.
///
/// Everything is stored as-is except `DateTime`, which is stored as epoch
/// milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct ScalarConverter<'a> {
    key: &'a str,
    value_type: ValueType,
}

impl<'a> ScalarConverter<'a> {
    pub fn new(key: &'a str, value_type: ValueType) -> Self {
        Self { key, value_type }
    }
}

impl PropertyConverter<Value, Value> for ScalarConverter<'_> {
    fn convert(&self, source: Value) -> Result<Value> {
        match (self.value_type, source) {
            (_, Value::Null) => Ok(Value::Null),
            (ValueType::String, v @ Value::String(_)) => Ok(v),
            (ValueType::Integer, v @ Value::Int(_)) => Ok(v),
            (ValueType::Float, v @ Value::Float(_)) => Ok(v),
            (ValueType::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (ValueType::Boolean, v @ Value::Bool(_)) => Ok(v),
            (ValueType::DateTime, Value::DateTime(dt)) => Ok(Value::Int(dt.timestamp_millis())),
            (expected, other) => Err(mismatch(self.key, other, expected)),
        }
    }

    fn revert(&self, target: Value) -> Result<Value> {
        match (self.value_type, target) {
            (ValueType::DateTime, Value::Int(ms)) => DateTime::<Utc>::from_timestamp_millis(ms)
                .map(Value::DateTime)
                .ok_or_else(|| mismatch(self.key, ms, ValueType::DateTime)),
            (ValueType::DateTime, v @ Value::DateTime(_)) => Ok(v),
            (_, stored) => self.convert(stored),
        }
    }
}

// ============================================================================
// Store side: dispatch
// ============================================================================

/// Store-side converter for any property kind.
pub enum StoreConverter<'a, S: Store + ?Sized> {
    Scalar(ScalarConverter<'a>),
    Endpoint(EndpointConverter<'a, S>),
}

impl<S: Store + ?Sized> PropertyConverter<Value, Value> for StoreConverter<'_, S> {
    fn convert(&self, source: Value) -> Result<Value> {
        match self {
            StoreConverter::Scalar(c) => c.convert(source),
            StoreConverter::Endpoint(c) => c.convert(source),
        }
    }

    fn revert(&self, target: Value) -> Result<Value> {
        match self {
            StoreConverter::Scalar(c) => c.revert(target),
            StoreConverter::Endpoint(c) => c.revert(target),
        }
    }
}

// ============================================================================
// Input side
// ============================================================================

/// Wire ↔ typed conversion with lenient coercion of string-encoded scalars.
#[derive(Debug, Clone, Copy)]
pub struct InputConverter<'a> {
    key: &'a str,
    value_type: ValueType,
}

impl<'a> InputConverter<'a> {
    pub fn new(key: &'a str, value_type: ValueType) -> Self {
        Self { key, value_type }
    }

    fn fail(&self, input: &serde_json::Value) -> Error {
        mismatch(self.key, input, self.value_type)
    }
}

impl PropertyConverter<serde_json::Value, Value> for InputConverter<'_> {
    fn convert(&self, source: serde_json::Value) -> Result<Value> {
        use serde_json::Value as Json;

        if source.is_null() {
            return Ok(Value::Null);
        }

        let converted = match (self.value_type, &source) {
            (ValueType::String, Json::String(s)) => Some(Value::String(s.clone())),
            (ValueType::String, Json::Number(n)) => Some(Value::String(n.to_string())),
            (ValueType::String, Json::Bool(b)) => Some(Value::String(b.to_string())),

            (ValueType::Integer, Json::Number(n)) => n.as_i64().or_else(|| {
                n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)
            }).map(Value::Int),
            (ValueType::Integer, Json::String(s)) => s.trim().parse::<i64>().ok().map(Value::Int),

            (ValueType::Float, Json::Number(n)) => n.as_f64().map(Value::Float),
            (ValueType::Float, Json::String(s)) => s.trim().parse::<f64>().ok().map(Value::Float),

            (ValueType::Boolean, Json::Bool(b)) => Some(Value::Bool(*b)),
            (ValueType::Boolean, Json::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },

            (ValueType::DateTime, Json::String(s)) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
            (ValueType::DateTime, Json::Number(n)) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(Value::DateTime),

            _ => None,
        };

        converted.ok_or_else(|| self.fail(&source))
    }

    fn revert(&self, target: Value) -> Result<serde_json::Value> {
        // Reuse the store-side type check so both directions agree on what fits
        ScalarConverter::new(self.key, self.value_type).convert(target.clone())?;
        Ok(target.to_json())
    }
}
