//! # Value <-> JSON Mapping
//!
//! Encoding rules:
//! - dates and datetimes become ISO-8601 strings
//! - geopoints become `{"lat": .., "lon": ..}`
//! - keys become `key:<encoded>`, text blobs become `text:<body>`
//! - lists map element-wise; an empty list encodes to `null`
//! - other scalars pass through
//!
//! Decoding tries a date parse on every string before looking at the
//! `key:`/`text:` prefixes, so a string that parses as a date never
//! reaches them. An empty JSON array decodes to [`Value::Null`]; empty
//! lists do not round-trip.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value as JsonValue};

use crate::store::{Entity, GeoPt, Key, Value};

use super::errors::{CodecError, CodecResult};

/// Synthetic field carrying an entity's encoded key
pub const KEY_FIELD: &str = "key";

const KEY_PREFIX: &str = "key:";
const TEXT_PREFIX: &str = "text:";

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ==================
// Encoding
// ==================

/// Encode a property value as JSON
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Int(i) => JsonValue::from(*i),
        // non-finite floats have no JSON form and encode as null
        Value::Float(f) => JsonValue::from(*f),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Text(t) => JsonValue::String(format!("{}{}", TEXT_PREFIX, t)),
        Value::Date(d) => JsonValue::String(d.format(DATE_FORMAT).to_string()),
        Value::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
        Value::GeoPt(pt) => {
            let mut obj = Map::new();
            obj.insert("lat".to_string(), JsonValue::from(pt.lat));
            obj.insert("lon".to_string(), JsonValue::from(pt.lon));
            JsonValue::Object(obj)
        }
        Value::Key(k) => JsonValue::String(format!("{}{}", KEY_PREFIX, k.encode())),
        Value::List(items) if items.is_empty() => JsonValue::Null,
        Value::List(items) => JsonValue::Array(items.iter().map(to_json).collect()),
    }
}

/// Encode an entity as a JSON object with its key under `"key"`
pub fn entity_to_json(entity: &Entity) -> JsonValue {
    let mut obj: Map<String, JsonValue> = entity
        .properties()
        .iter()
        .map(|(name, value)| (name.clone(), to_json(value)))
        .collect();
    if let Some(key) = entity.key() {
        obj.insert(KEY_FIELD.to_string(), JsonValue::String(key.encode()));
    }
    JsonValue::Object(obj)
}

// ==================
// Decoding
// ==================

fn parse_date(s: &str) -> Option<Value> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Value::DateTime(dt));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, NAIVE_DATETIME_FORMAT) {
        return Some(Value::DateTime(naive.and_utc().fixed_offset()));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok().map(Value::Date)
}

fn decode_string(s: &str) -> CodecResult<Value> {
    if let Some(date) = parse_date(s) {
        return Ok(date);
    }
    if let Some(encoded) = s.strip_prefix(KEY_PREFIX) {
        return Key::decode(encoded)
            .map(Value::Key)
            .map_err(|_| CodecError::InvalidKey(s.to_string()));
    }
    if let Some(text) = s.strip_prefix(TEXT_PREFIX) {
        return Ok(Value::Text(text.to_string()));
    }
    Ok(Value::Str(s.to_string()))
}

fn decode_object(obj: &Map<String, JsonValue>) -> CodecResult<Value> {
    let coords = (obj.len() == 2)
        .then(|| (obj.get("lat"), obj.get("lon")))
        .and_then(|(lat, lon)| Some((lat?.as_f64()?, lon?.as_f64()?)));
    match coords {
        Some((lat, lon)) => Ok(Value::GeoPt(GeoPt::new(lat, lon))),
        None => Err(CodecError::UnsupportedObject(JsonValue::Object(obj.clone()).to_string())),
    }
}

/// Decode a JSON value into a property value
pub fn from_json(json: &JsonValue) -> CodecResult<Value> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => Ok(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        JsonValue::String(s) => decode_string(s),
        JsonValue::Array(items) if items.is_empty() => Ok(Value::Null),
        JsonValue::Array(items) => items
            .iter()
            .map(from_json)
            .collect::<CodecResult<Vec<_>>>()
            .map(Value::List),
        JsonValue::Object(obj) => decode_object(obj),
    }
}

/// Overwrite entity properties from a JSON object
///
/// The synthetic `key` field is ignored. Nothing is applied unless every
/// field decodes.
pub fn apply_json(entity: &mut Entity, body: &Map<String, JsonValue>) -> CodecResult<()> {
    let decoded = body
        .iter()
        .filter(|(name, _)| name.as_str() != KEY_FIELD)
        .map(|(name, json)| Ok((name.clone(), from_json(json)?)))
        .collect::<CodecResult<Vec<_>>>()?;
    for (name, value) in decoded {
        entity.set(name, value);
    }
    Ok(())
}

/// Parse a request body that must be a JSON object
pub fn parse_body(body: &[u8]) -> CodecResult<Map<String, JsonValue>> {
    match serde_json::from_slice::<JsonValue>(body) {
        Ok(JsonValue::Object(obj)) => Ok(obj),
        Ok(other) => Err(CodecError::InvalidBody(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(CodecError::InvalidBody(e.to_string())),
    }
}

fn json_type_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    fn round_trip(value: Value) {
        let encoded = to_json(&value);
        assert_eq!(from_json(&encoded).unwrap(), value, "via {}", encoded);
    }

    #[test]
    fn test_tagged_types_round_trip() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        round_trip(Value::DateTime(offset.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()));
        round_trip(Value::Date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
        round_trip(Value::GeoPt(GeoPt::new(51.5, -0.12)));
        round_trip(Value::Key(Key::with_id("Post", 42)));
        round_trip(Value::Text("a long body".to_string()));
        round_trip(Value::List(vec![Value::Int(1), Value::Text("t".to_string())]));
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(to_json(&Value::Int(3)), json!(3));
        assert_eq!(to_json(&Value::Bool(true)), json!(true));
        assert_eq!(to_json(&Value::Str("plain".into())), json!("plain"));
        assert_eq!(from_json(&json!(2.5)).unwrap(), Value::Float(2.5));
        assert_eq!(from_json(&json!(7)).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_empty_list_becomes_null() {
        assert_eq!(to_json(&Value::List(vec![])), JsonValue::Null);
        assert_eq!(from_json(&json!([])).unwrap(), Value::Null);
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(to_json(&Value::Float(f64::NAN)), JsonValue::Null);
    }

    #[test]
    fn test_date_parse_wins_over_prefixes() {
        assert!(matches!(from_json(&json!("2024-01-02")).unwrap(), Value::Date(_)));
        assert!(matches!(
            from_json(&json!("2024-01-02T10:00:00")).unwrap(),
            Value::DateTime(_)
        ));
        assert_eq!(
            from_json(&json!("text:2024-01-02")).unwrap(),
            Value::Text("2024-01-02".to_string())
        );
    }

    #[test]
    fn test_invalid_key_reference() {
        assert!(matches!(
            from_json(&json!("key:!!!")),
            Err(CodecError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_unsupported_object() {
        assert!(matches!(
            from_json(&json!({"lat": 1.0})),
            Err(CodecError::UnsupportedObject(_))
        ));
        assert!(matches!(
            from_json(&json!({"a": 1, "b": 2})),
            Err(CodecError::UnsupportedObject(_))
        ));
    }

    #[test]
    fn test_entity_json_carries_key() {
        let mut entity = Entity::with_key(Key::with_id("Post", 9));
        entity.set("title", "hi");
        let json = entity_to_json(&entity);
        assert_eq!(json["title"], "hi");
        assert_eq!(json["key"], Key::with_id("Post", 9).encode());
    }

    #[test]
    fn test_apply_json_skips_key_and_is_atomic() {
        let mut entity = Entity::new("Post");
        let body = parse_body(br#"{"key": "ignored", "votes": 3}"#).unwrap();
        apply_json(&mut entity, &body).unwrap();
        assert_eq!(entity.get("votes"), Some(&Value::Int(3)));
        assert!(entity.get("key").is_none());

        let bad = parse_body(br#"{"a": 1, "z": {"nested": true}}"#).unwrap();
        assert!(apply_json(&mut entity, &bad).is_err());
        assert!(entity.get("a").is_none());
    }

    #[test]
    fn test_parse_body_requires_object() {
        assert!(matches!(parse_body(b"[1, 2]"), Err(CodecError::InvalidBody(_))));
        assert!(matches!(parse_body(b"{oops"), Err(CodecError::InvalidBody(_))));
    }
}
