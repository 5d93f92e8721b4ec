//! JSON <-> row value conversion

use rust_decimal::Decimal;
use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::row::{Row, RowError};
use crate::value::Value;

/// Converts a decoded JSON token into a row value.
///
/// Objects become [`Row`]s, arrays become lists, scalars become their raw
/// value. Integers that fit `i64` are `Int64`, larger unsigned integers are
/// `Decimal`, everything else numeric is `Double`.
pub fn json_to_value(token: serde_json::Value) -> Result<Value, RowError> {
    match token {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int64(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Decimal(Decimal::from(u)))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Double(f))
            } else {
                Err(RowError::UnsupportedShape {
                    shape: format!("number {n}"),
                })
            }
        }
        serde_json::Value::String(s) => Ok(Value::String(s)),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(json_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| json_to_value(v).map(|v| (k, v)))
            .collect::<Result<Row, _>>()
            .map(Value::Row),
    }
}

/// Converts a row value into JSON. Rows emit as plain objects.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(value)
}

impl TryFrom<serde_json::Value> for Row {
    type Error = RowError;

    fn try_from(token: serde_json::Value) -> Result<Self, Self::Error> {
        match json_to_value(token)? {
            Value::Row(row) => Ok(row),
            other => Err(RowError::UnsupportedShape {
                shape: other.type_name().to_string(),
            }),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = serde_json::Value::deserialize(deserializer)?;
        Row::try_from(token).map_err(D::Error::custom)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Byte(n) => serializer.serialize_u8(*n),
            Value::Int16(n) => serializer.serialize_i16(*n),
            Value::Int32(n) => serializer.serialize_i32(*n),
            Value::Int64(n) => serializer.serialize_i64(*n),
            Value::Single(n) => serializer.serialize_f32(*n),
            Value::Double(n) => serializer.serialize_f64(*n),
            Value::Decimal(_) | Value::DateTime(_) | Value::Guid(_) | Value::Type(_) => {
                serializer.collect_str(self)
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Binary(bytes) => serializer.serialize_bytes(bytes),
            Value::Row(row) => row.serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = serde_json::Value::deserialize(deserializer)?;
        json_to_value(token).map_err(D::Error::custom)
    }
}
