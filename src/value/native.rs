use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Number, Value as JsonValue};

use crate::error::{invalid_argument, unsupported_value, FirestoreResult};
use crate::model::Timestamp;

/// Plain application value, before encoding or after decoding.
///
/// Timestamps and references are only produced when the caller asks for them
/// explicitly; a string that happens to look like a date stays a string.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(Timestamp),
    Reference(String),
    Array(Vec<NativeValue>),
    Map(IndexMap<String, NativeValue>),
}

impl NativeValue {
    /// Parses `value` as RFC 3339 and marks it as a timestamp.
    pub fn timestamp_from_str(value: &str) -> FirestoreResult<Self> {
        Timestamp::parse_rfc3339(value).map(NativeValue::Timestamp)
    }

    pub fn reference(path: impl Into<String>) -> Self {
        NativeValue::Reference(path.into())
    }

    /// Converts any serde-serializable value through its JSON shape.
    pub fn from_serializable<T>(value: &T) -> FirestoreResult<Self>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_value(value)
            .map_err(|err| unsupported_value(format!("Value cannot be represented: {err}")))?;
        Ok(NativeValue::from(json))
    }

    /// Deserializes this value into `T` through its JSON shape.
    ///
    /// Timestamps become RFC 3339 strings and references their path string.
    pub fn deserialize_into<T>(&self) -> FirestoreResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.to_json())
            .map_err(|err| invalid_argument(format!("Failed to deserialize value: {err}")))
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            NativeValue::Null => JsonValue::Null,
            NativeValue::Bool(value) => JsonValue::Bool(*value),
            NativeValue::Integer(value) => JsonValue::Number(Number::from(*value)),
            NativeValue::Double(value) => Number::from_f64(*value)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            NativeValue::String(value) | NativeValue::Reference(value) => {
                JsonValue::String(value.clone())
            }
            NativeValue::Timestamp(value) => JsonValue::String(value.to_rfc3339()),
            NativeValue::Array(values) => {
                JsonValue::Array(values.iter().map(NativeValue::to_json).collect())
            }
            NativeValue::Map(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }
}

impl From<JsonValue> for NativeValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => NativeValue::Null,
            JsonValue::Bool(value) => NativeValue::Bool(value),
            JsonValue::Number(number) => match number.as_i64() {
                Some(integer) => NativeValue::Integer(integer),
                None => NativeValue::Double(number.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(value) => NativeValue::String(value),
            JsonValue::Array(values) => {
                NativeValue::Array(values.into_iter().map(NativeValue::from).collect())
            }
            JsonValue::Object(fields) => NativeValue::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, NativeValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Bool(value)
    }
}

macro_rules! native_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for NativeValue {
                fn from(value: $ty) -> Self {
                    NativeValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

native_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for NativeValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(integer) => NativeValue::Integer(integer),
            Err(_) => NativeValue::Double(value as f64),
        }
    }
}

impl From<f32> for NativeValue {
    fn from(value: f32) -> Self {
        NativeValue::Double(f64::from(value))
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        NativeValue::Double(value)
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::String(value.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        NativeValue::String(value)
    }
}

impl From<Timestamp> for NativeValue {
    fn from(value: Timestamp) -> Self {
        NativeValue::Timestamp(value)
    }
}

impl<T> From<Option<T>> for NativeValue
where
    T: Into<NativeValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(NativeValue::Null)
    }
}

impl<T> From<Vec<T>> for NativeValue
where
    T: Into<NativeValue>,
{
    fn from(values: Vec<T>) -> Self {
        NativeValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, NativeValue>> for NativeValue {
    fn from(fields: IndexMap<String, NativeValue>) -> Self {
        NativeValue::Map(fields)
    }
}
