use indexmap::IndexMap;

use crate::model::Timestamp;
use crate::value::{ArrayValue, MapValue};

/// A value as the store represents it: tagged with exactly one kind.
#[derive(Clone, Debug, PartialEq)]
pub struct FirestoreValue {
    kind: ValueKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Reference(String),
    Array(ArrayValue),
    Map(MapValue),
}

impl ValueKind {
    /// The wire key carrying this kind (`stringValue`, `mapValue`, ...).
    pub fn tag(&self) -> &'static str {
        match self {
            ValueKind::Null => "nullValue",
            ValueKind::Boolean(_) => "booleanValue",
            ValueKind::Integer(_) => "integerValue",
            ValueKind::Double(_) => "doubleValue",
            ValueKind::Timestamp(_) => "timestampValue",
            ValueKind::String(_) => "stringValue",
            ValueKind::Reference(_) => "referenceValue",
            ValueKind::Array(_) => "arrayValue",
            ValueKind::Map(_) => "mapValue",
        }
    }
}

impl FirestoreValue {
    pub fn null() -> Self {
        Self {
            kind: ValueKind::Null,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self {
            kind: ValueKind::Boolean(value),
        }
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            kind: ValueKind::Integer(value),
        }
    }

    pub fn from_double(value: f64) -> Self {
        Self {
            kind: ValueKind::Double(value),
        }
    }

    pub fn from_timestamp(value: Timestamp) -> Self {
        Self {
            kind: ValueKind::Timestamp(value),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn from_reference(path: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Reference(path.into()),
        }
    }

    pub fn from_array(values: Vec<FirestoreValue>) -> Self {
        Self {
            kind: ValueKind::Array(ArrayValue::new(values)),
        }
    }

    pub fn from_map(map: IndexMap<String, FirestoreValue>) -> Self {
        Self {
            kind: ValueKind::Map(MapValue::new(map)),
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_values() {
        let v = FirestoreValue::from_string("hello");
        match v.kind() {
            ValueKind::String(value) => assert_eq!(value, "hello"),
            _ => panic!("unexpected kind"),
        }
        assert_eq!(v.kind().tag(), "stringValue");
    }

    #[test]
    fn null_is_detected() {
        assert!(FirestoreValue::null().is_null());
        assert!(!FirestoreValue::from_integer(0).is_null());
    }
}
