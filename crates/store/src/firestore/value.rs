//! Firestore typed-value codec.
//!
//! Firestore's JSON API wraps every field in an object naming its type:
//!
//! ```json
//! { "stock": { "integerValue": "4" }, "price": { "doubleValue": 12.5 } }
//! ```
//!
//! Integers travel as strings and timestamps as RFC 3339. [`WireValue`] is a
//! serde mirror of that shape; [`encode`] and [`decode`] convert to and from
//! [`Value`].

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Fields, Value};

/// Firestore `Value` as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<WireValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, WireValue>,
}

/// Convert a field value to its wire form.
#[must_use]
pub fn encode(value: &Value) -> WireValue {
    match value {
        Value::Null => WireValue::NullValue(()),
        Value::Bool(b) => WireValue::BooleanValue(*b),
        Value::Integer(i) => WireValue::IntegerValue(i.to_string()),
        Value::Double(d) => WireValue::DoubleValue(*d),
        Value::String(s) => WireValue::StringValue(s.clone()),
        Value::Timestamp(t) => {
            WireValue::TimestampValue(t.to_rfc3339_opts(SecondsFormat::Micros, true))
        }
        Value::Array(values) => WireValue::ArrayValue(ArrayValue {
            values: values.iter().map(encode).collect(),
        }),
        Value::Map(fields) => WireValue::MapValue(MapValue {
            fields: encode_fields(fields),
        }),
    }
}

/// Convert every field of a document to its wire form.
#[must_use]
pub fn encode_fields(fields: &Fields) -> BTreeMap<String, WireValue> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode(value)))
        .collect()
}

/// Convert a wire value back to a field value.
///
/// Bytes and references have no counterpart in [`Value`] and decode to their
/// string form; geo points decode to a `latitude`/`longitude` map.
///
/// # Errors
///
/// Returns a description of the problem when an integer or timestamp string
/// does not parse.
pub fn decode(value: WireValue) -> Result<Value, String> {
    Ok(match value {
        WireValue::NullValue(()) => Value::Null,
        WireValue::BooleanValue(b) => Value::Bool(b),
        WireValue::IntegerValue(s) => Value::Integer(
            s.parse()
                .map_err(|e| format!("invalid integerValue {s:?}: {e}"))?,
        ),
        WireValue::DoubleValue(d) => Value::Double(d),
        WireValue::TimestampValue(s) => Value::Timestamp(
            DateTime::parse_from_rfc3339(&s)
                .map_err(|e| format!("invalid timestampValue {s:?}: {e}"))?
                .with_timezone(&Utc),
        ),
        WireValue::StringValue(s) | WireValue::BytesValue(s) | WireValue::ReferenceValue(s) => {
            Value::String(s)
        }
        WireValue::GeoPointValue(point) => Value::Map(Fields::from([
            ("latitude".to_string(), Value::Double(point.latitude)),
            ("longitude".to_string(), Value::Double(point.longitude)),
        ])),
        WireValue::ArrayValue(array) => Value::Array(
            array
                .values
                .into_iter()
                .map(decode)
                .collect::<Result<_, _>>()?,
        ),
        WireValue::MapValue(map) => Value::Map(decode_fields(map.fields)?),
    })
}

/// Convert every wire field back to a field value.
///
/// # Errors
///
/// Fails on the first field that does not decode, naming it.
pub fn decode_fields(fields: BTreeMap<String, WireValue>) -> Result<Fields, String> {
    fields
        .into_iter()
        .map(|(name, value)| match decode(value) {
            Ok(value) => Ok((name, value)),
            Err(e) => Err(format!("{name}: {e}")),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_integers_travel_as_strings() {
        let wire = serde_json::to_value(encode(&Value::Integer(42))).unwrap();
        assert_eq!(wire, json!({ "integerValue": "42" }));
    }

    #[test]
    fn test_null_encodes_as_json_null() {
        let wire = serde_json::to_value(encode(&Value::Null)).unwrap();
        assert_eq!(wire, json!({ "nullValue": null }));
        let back: WireValue = serde_json::from_value(wire).unwrap();
        assert_eq!(decode(back).unwrap(), Value::Null);
    }

    #[test]
    fn test_timestamps_are_rfc3339() {
        let t = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let wire = serde_json::to_value(encode(&Value::Timestamp(t))).unwrap();
        assert_eq!(
            wire,
            json!({ "timestampValue": "2025-03-14T15:09:26.000000Z" })
        );

        let parsed: WireValue =
            serde_json::from_value(json!({ "timestampValue": "2025-03-14T15:09:26.123Z" }))
                .unwrap();
        let value = decode(parsed).unwrap();
        assert_eq!(
            value.as_timestamp().unwrap().timestamp_millis(),
            t.timestamp_millis() + 123
        );
    }

    #[test]
    fn test_decodes_order_document_fields() {
        let raw = json!({
            "customerName": { "stringValue": "Ada" },
            "total": { "doubleValue": 12.5 },
            "items": { "arrayValue": { "values": [
                { "mapValue": { "fields": {
                    "id": { "stringValue": "p1" },
                    "quantity": { "integerValue": "2" },
                    "price": { "integerValue": "5" }
                } } }
            ] } },
            "shippedAt": { "nullValue": null }
        });
        let wire: BTreeMap<String, WireValue> = serde_json::from_value(raw).unwrap();
        let fields = decode_fields(wire).unwrap();

        assert_eq!(fields["customerName"], Value::from("Ada"));
        assert_eq!(fields["total"], Value::Double(12.5));
        assert_eq!(fields["shippedAt"], Value::Null);
        let items = fields["items"].as_array().unwrap();
        let item = items[0].as_map().unwrap();
        assert_eq!(item["quantity"], Value::Integer(2));
        assert_eq!(item["price"].as_f64(), Some(5.0));
    }

    #[test]
    fn test_empty_array_and_map_decode() {
        let wire: WireValue = serde_json::from_value(json!({ "arrayValue": {} })).unwrap();
        assert_eq!(decode(wire).unwrap(), Value::Array(Vec::new()));
        let wire: WireValue = serde_json::from_value(json!({ "mapValue": {} })).unwrap();
        assert_eq!(decode(wire).unwrap(), Value::Map(Fields::new()));
    }

    #[test]
    fn test_bad_integer_names_field() {
        let wire = BTreeMap::from([(
            "stock".to_string(),
            WireValue::IntegerValue("lots".to_string()),
        )]);
        let err = decode_fields(wire).unwrap_err();
        assert!(err.starts_with("stock:"), "{err}");
    }

    #[test]
    fn test_nested_map_encodes() {
        let value = Value::Map(Fields::from([(
            "tags".to_string(),
            Value::Array(vec![Value::from("a"), Value::Bool(true)]),
        )]));
        let wire = serde_json::to_value(encode(&value)).unwrap();
        assert_eq!(
            wire,
            json!({ "mapValue": { "fields": { "tags": { "arrayValue": { "values": [
                { "stringValue": "a" },
                { "booleanValue": true }
            ] } } } } })
        );
    }
}
