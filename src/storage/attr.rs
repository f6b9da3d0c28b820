// src/storage/attr.rs

//! Conversions between JSON values and DynamoDB attribute values.
//!
//! Numbers travel as their decimal string form (`AttributeValue::N`), so
//! nothing here ever reinterprets a number through binary floating point
//! on the way to the table.

use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};

use crate::error::{AppError, Result};

/// Convert a JSON object into a DynamoDB item.
pub fn to_item(value: Value) -> Result<HashMap<String, AttributeValue>> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| Ok((k, to_attr(v))))
            .collect(),
        other => Err(AppError::dynamodb(format!(
            "expected a JSON object for an item, got {other}"
        ))),
    }
}

/// Convert a DynamoDB item back into a JSON object.
pub fn from_item(item: HashMap<String, AttributeValue>) -> Result<Value> {
    let mut map = Map::new();
    for (key, attr) in item {
        map.insert(key, from_attr(attr)?);
    }
    Ok(Value::Object(map))
}

/// Convert one JSON value into an attribute value.
pub fn to_attr(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => {
            AttributeValue::L(items.into_iter().map(to_attr).collect())
        }
        Value::Object(map) => {
            AttributeValue::M(map.into_iter().map(|(k, v)| (k, to_attr(v))).collect())
        }
    }
}

/// Convert one attribute value back into JSON.
pub fn from_attr(attr: AttributeValue) -> Result<Value> {
    Ok(match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::N(n) => Value::Number(
            Number::from_str(&n)
                .map_err(|e| AppError::dynamodb(format!("bad numeric attribute {n}: {e}")))?,
        ),
        AttributeValue::L(items) => {
            Value::Array(items.into_iter().map(from_attr).collect::<Result<_>>()?)
        }
        AttributeValue::M(map) => {
            let mut object = Map::new();
            for (key, value) in map {
                object.insert(key, from_attr(value)?);
            }
            Value::Object(object)
        }
        AttributeValue::Ss(items) => {
            Value::Array(items.into_iter().map(Value::String).collect())
        }
        other => {
            return Err(AppError::dynamodb(format!(
                "unsupported attribute value: {other:?}"
            )));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_object_round_trip() {
        let value = serde_json::json!({
            "id": 7,
            "last_name": "Doe",
            "active": true,
            "nickname": null,
            "address": {
                "city": "Springfield",
                "coordinates": {"lat": 1.5, "lng": -2.25}
            },
            "tags": ["a", "b"]
        });

        let item = to_item(value.clone()).unwrap();
        assert_eq!(item["id"], AttributeValue::N("7".to_string()));
        assert_eq!(item["last_name"], AttributeValue::S("Doe".to_string()));

        let back = from_item(item).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_non_object_item_rejected() {
        assert!(to_item(serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn test_number_leaves_as_decimal_string() {
        let attr = to_attr(serde_json::json!(0.1));
        assert_eq!(attr, AttributeValue::N("0.1".to_string()));
    }
}
