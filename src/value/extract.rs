//! Get-with-default accessors over decoded document fields.
//!
//! Documents written before a field existed simply lack it, so every accessor
//! returns a sentinel (`""`, `0`, `0.0`, `false`, empty, `Null`) for absent or
//! differently-typed fields instead of failing.

use indexmap::IndexMap;

use crate::model::Timestamp;
use crate::value::{decode_fields, decode_value, FirestoreValue, NativeValue, ValueKind};

/// Looks up `field`, first as a literal key, then as a dotted path into nested maps.
pub fn lookup<'a>(
    fields: &'a IndexMap<String, FirestoreValue>,
    field: &str,
) -> Option<&'a FirestoreValue> {
    if let Some(value) = fields.get(field) {
        return Some(value);
    }
    let mut segments = field.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = match current.kind() {
            ValueKind::Map(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Applies `extract` to the field, falling back to `T::default()`.
pub fn field_or_default<T, F>(fields: &IndexMap<String, FirestoreValue>, field: &str, extract: F) -> T
where
    T: Default,
    F: FnOnce(&ValueKind) -> Option<T>,
{
    lookup(fields, field)
        .and_then(|value| extract(value.kind()))
        .unwrap_or_default()
}

pub fn string(fields: &IndexMap<String, FirestoreValue>, field: &str) -> String {
    field_or_default(fields, field, |kind| match kind {
        ValueKind::String(value) | ValueKind::Reference(value) => Some(value.clone()),
        ValueKind::Timestamp(value) => Some(value.to_rfc3339()),
        _ => None,
    })
}

pub fn integer(fields: &IndexMap<String, FirestoreValue>, field: &str) -> i64 {
    field_or_default(fields, field, |kind| match kind {
        ValueKind::Integer(value) => Some(*value),
        ValueKind::Double(value) if value.is_finite() => Some(value.trunc() as i64),
        _ => None,
    })
}

pub fn double(fields: &IndexMap<String, FirestoreValue>, field: &str) -> f64 {
    field_or_default(fields, field, |kind| match kind {
        ValueKind::Double(value) => Some(*value),
        ValueKind::Integer(value) => Some(*value as f64),
        _ => None,
    })
}

pub fn boolean(fields: &IndexMap<String, FirestoreValue>, field: &str) -> bool {
    field_or_default(fields, field, |kind| match kind {
        ValueKind::Boolean(value) => Some(*value),
        _ => None,
    })
}

pub fn timestamp(fields: &IndexMap<String, FirestoreValue>, field: &str) -> Option<Timestamp> {
    field_or_default(fields, field, |kind| match kind {
        ValueKind::Timestamp(value) => Some(Some(*value)),
        _ => None,
    })
}

pub fn array(fields: &IndexMap<String, FirestoreValue>, field: &str) -> Vec<NativeValue> {
    field_or_default(fields, field, |kind| match kind {
        ValueKind::Array(array) => Some(array.values().iter().map(decode_value).collect()),
        _ => None,
    })
}

pub fn map(fields: &IndexMap<String, FirestoreValue>, field: &str) -> IndexMap<String, NativeValue> {
    field_or_default(fields, field, |kind| match kind {
        ValueKind::Map(map) => Some(decode_fields(map.fields())),
        _ => None,
    })
}

/// Decoded value of any kind; `Null` when absent.
pub fn value(fields: &IndexMap<String, FirestoreValue>, field: &str) -> NativeValue {
    lookup(fields, field)
        .map(decode_value)
        .unwrap_or(NativeValue::Null)
}
