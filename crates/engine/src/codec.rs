//! Row codec: documents to and from their stored JSON
//!
//! A row holds two payloads. `json` is the whole document as created (or as
//! last rewritten by a batch update); `json_updates` holds the non-locked
//! fields written by later single updates. Reading overlays the second onto
//! the first, key by key, at the top level.
//!
//! Null-valued fields are never written.

use serde_json::{Map, Value};

use colonnade_core::{Error, Persisted, Result};

/// Which fields [`encode`] keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFilter {
    /// Every field (full writes)
    All,
    /// Every field except `P::LOCKED_FIELDS` (update deltas)
    SkipLocked,
}

fn to_object<P: Persisted>(doc: &P) -> Result<Map<String, Value>> {
    match serde_json::to_value(doc)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::serialization(format!(
            "documents must serialize to a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn parse_object(payload: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(payload)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::serialization(format!(
            "stored payload is not a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn filtered<P: Persisted>(doc: &P, filter: FieldFilter) -> Result<Map<String, Value>> {
    let mut map = to_object(doc)?;
    map.retain(|field, value| {
        !value.is_null()
            && (filter == FieldFilter::All || !P::LOCKED_FIELDS.contains(&field.as_str()))
    });
    Ok(map)
}

/// Serialize a document for storage.
///
/// # Example
///
/// ```ignore
/// let delta = codec::encode(&doc, FieldFilter::SkipLocked)?;
/// assert!(!delta.contains("\"timestamp\""));
/// ```
pub fn encode<P: Persisted>(doc: &P, filter: FieldFilter) -> Result<String> {
    Ok(Value::Object(filtered(doc, filter)?).to_string())
}

/// Rebuild a document from its stored payloads.
///
/// Returns `Ok(None)` when the base payload is missing or blank. Fields in
/// `updates` replace fields of the same name in `base`.
pub fn decode<P: Persisted>(base: Option<&str>, updates: Option<&str>) -> Result<Option<P>> {
    let Some(base) = base.filter(|b| !b.trim().is_empty()) else {
        return Ok(None);
    };
    let mut map = parse_object(base)?;
    if let Some(updates) = updates.filter(|u| !u.trim().is_empty()) {
        map.extend(parse_object(updates)?);
    }
    Ok(Some(serde_json::from_value(Value::Object(map))?))
}

/// Fold the non-locked fields of `incoming` over `existing`.
///
/// Locked fields always keep the values in `existing`.
pub fn merge<P: Persisted>(existing: &P, incoming: &P) -> Result<P> {
    let mut map = to_object(existing)?;
    map.extend(filtered(incoming, FieldFilter::SkipLocked)?);
    Ok(serde_json::from_value(Value::Object(map))?)
}
