use serde_json::{Map, Value};

/// An unordered mapping of field names to JSON values.
///
/// Entity payloads, edge properties and source payloads all share this shape.
/// `serde_json` is built without `preserve_order`, so iteration is always in
/// key order.
pub type Record = Map<String, Value>;

/// Borrow a string field from a record, treating non-strings and empty strings
/// as absent.
pub fn record_str<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    match record.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}
