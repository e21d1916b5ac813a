//! Response normalization.
//!
//! List endpoints of the dashboard API answer in one of three shapes:
//!
//! - a bare array: `[{..}, {..}]`
//! - an envelope: `{"items": [..], "total": 42}`
//! - a nested envelope: `{"data": {"items": [..], "total": 42}}`
//!
//! `total` is optional in both envelopes and falls back to the item count.
//! Whole floats and numeric strings are accepted for it.
//! Anything else is a [`NormalizeError`], which callers render as an empty
//! result with a message rather than propagating.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::page::ListResult;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("unrecognized list response shape: {found}")]
    UnrecognizedShape { found: &'static str },

    #[error("list item #{index} could not be decoded: {message}")]
    InvalidItem { index: usize, message: String },
}

/// Which of the accepted shapes a payload matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseShape {
    Bare,
    Envelope,
    Nested,
}

#[derive(Deserialize)]
struct Envelope {
    items: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_total")]
    total: Option<u64>,
}

/// Accepts `25`, `25.0` and `"25"`; anything else that is not a
/// non-negative whole number rejects the envelope.
fn lenient_total<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                    .map(|f| f as u64)
            })
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("total {n} is not a non-negative whole number"))),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!("total must be a number, got {other}"))),
    }
}

#[derive(Deserialize)]
struct Nested {
    data: Envelope,
}

// Variant order is the precedence: top-level `items` wins over `data.items`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Shape {
    Bare(Vec<Value>),
    Envelope(Envelope),
    Nested(Nested),
}

fn describe(payload: &Value) -> &'static str {
    match payload {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(map) if map.contains_key("items") => "object with invalid items/total",
        Value::Object(map) if map.contains_key("data") => "object with invalid data",
        Value::Object(_) => "object without items",
    }
}

/// Normalize into raw JSON items, reporting the matched shape.
pub fn normalize_value(payload: Value) -> Result<(ResponseShape, ListResult<Value>), NormalizeError> {
    let found = describe(&payload);
    let shape: Shape =
        serde_json::from_value(payload).map_err(|_| NormalizeError::UnrecognizedShape { found })?;

    let normalized = match shape {
        Shape::Bare(items) => {
            let total = items.len() as u64;
            (ResponseShape::Bare, ListResult::new(items, total))
        }
        Shape::Envelope(env) => (ResponseShape::Envelope, from_envelope(env)),
        Shape::Nested(nested) => (ResponseShape::Nested, from_envelope(nested.data)),
    };
    Ok(normalized)
}

fn from_envelope(env: Envelope) -> ListResult<Value> {
    let total = env.total.unwrap_or(env.items.len() as u64);
    ListResult::new(env.items, total)
}

/// Decode every raw item into `T`, reporting the first failing index.
pub fn decode_items<T: DeserializeOwned>(raw: ListResult<Value>) -> Result<ListResult<T>, NormalizeError> {
    let total = raw.total;
    let items = raw
        .items
        .into_iter()
        .enumerate()
        .map(|(index, v)| {
            serde_json::from_value(v).map_err(|e| NormalizeError::InvalidItem {
                index,
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<T>, _>>()?;
    Ok(ListResult::new(items, total))
}

/// Normalize and decode every item into `T`.
pub fn normalize<T: DeserializeOwned>(payload: Value) -> Result<ListResult<T>, NormalizeError> {
    let (_, raw) = normalize_value(payload)?;
    decode_items(raw)
}
