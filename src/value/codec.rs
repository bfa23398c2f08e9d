use indexmap::IndexMap;

use crate::constants::MAX_VALUE_DEPTH;
use crate::error::{unsupported_value, FirestoreResult};
use crate::value::{FirestoreValue, MapValue, NativeValue, ValueKind};

/// Encodes a native value into its typed representation.
///
/// Doubles without a fractional part that fit in an `i64` are sent as
/// integers, so `3.0` decodes back as `Integer(3)`.
pub fn encode_value(value: &NativeValue) -> FirestoreResult<FirestoreValue> {
    encode_at_depth(value, 0, false)
}

/// Encodes every entry of a field map, keeping its order.
pub fn encode_fields(fields: &IndexMap<String, NativeValue>) -> FirestoreResult<MapValue> {
    encode_map(fields, 0).map(MapValue::new)
}

/// Decodes a typed value back into a native value. Never fails.
pub fn decode_value(value: &FirestoreValue) -> NativeValue {
    match value.kind() {
        ValueKind::Null => NativeValue::Null,
        ValueKind::Boolean(value) => NativeValue::Bool(*value),
        ValueKind::Integer(value) => NativeValue::Integer(*value),
        ValueKind::Double(value) => NativeValue::Double(*value),
        ValueKind::Timestamp(value) => NativeValue::Timestamp(*value),
        ValueKind::String(value) => NativeValue::String(value.clone()),
        ValueKind::Reference(value) => NativeValue::Reference(value.clone()),
        ValueKind::Array(array) => {
            NativeValue::Array(array.values().iter().map(decode_value).collect())
        }
        ValueKind::Map(map) => NativeValue::Map(decode_fields(map.fields())),
    }
}

pub fn decode_fields(fields: &IndexMap<String, FirestoreValue>) -> IndexMap<String, NativeValue> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

fn encode_at_depth(
    value: &NativeValue,
    depth: usize,
    inside_array: bool,
) -> FirestoreResult<FirestoreValue> {
    let encoded = match value {
        NativeValue::Null => FirestoreValue::null(),
        NativeValue::Bool(value) => FirestoreValue::from_bool(*value),
        NativeValue::Integer(value) => FirestoreValue::from_integer(*value),
        NativeValue::Double(value) => encode_number(*value),
        NativeValue::String(value) => FirestoreValue::from_string(value.as_str()),
        NativeValue::Timestamp(value) => {
            if !value.is_storable() {
                return Err(unsupported_value(format!(
                    "Timestamp {}s is outside the supported range (years 0001 to 9999)",
                    value.seconds
                )));
            }
            FirestoreValue::from_timestamp(*value)
        }
        NativeValue::Reference(value) => FirestoreValue::from_reference(value.as_str()),
        NativeValue::Array(values) => {
            if inside_array {
                return Err(unsupported_value(
                    "Nested arrays are not supported; wrap the inner array in a map",
                ));
            }
            check_depth(depth + 1)?;
            let encoded = values
                .iter()
                .map(|value| encode_at_depth(value, depth + 1, true))
                .collect::<FirestoreResult<Vec<_>>>()?;
            FirestoreValue::from_array(encoded)
        }
        NativeValue::Map(fields) => {
            check_depth(depth + 1)?;
            FirestoreValue::from_map(encode_map(fields, depth + 1)?)
        }
    };
    Ok(encoded)
}

fn encode_map(
    fields: &IndexMap<String, NativeValue>,
    depth: usize,
) -> FirestoreResult<IndexMap<String, FirestoreValue>> {
    let mut encoded = IndexMap::with_capacity(fields.len());
    for (key, value) in fields {
        if key.is_empty() {
            return Err(unsupported_value("Field names cannot be empty"));
        }
        encoded.insert(key.clone(), encode_at_depth(value, depth, false)?);
    }
    Ok(encoded)
}

fn encode_number(value: f64) -> FirestoreValue {
    let integral = value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value < i64::MAX as f64;
    if integral {
        FirestoreValue::from_integer(value as i64)
    } else {
        FirestoreValue::from_double(value)
    }
}

fn check_depth(depth: usize) -> FirestoreResult<()> {
    if depth > MAX_VALUE_DEPTH {
        return Err(unsupported_value(format!(
            "Value nesting exceeds the maximum depth of {MAX_VALUE_DEPTH}"
        )));
    }
    Ok(())
}
