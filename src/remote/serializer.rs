use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};

use crate::api::Document;
use crate::error::{invalid_argument, transport_error, FirestoreResult};
use crate::model::{DatabaseId, DocumentKey, FieldPath, Timestamp};
use crate::value::{FirestoreValue, MapValue, ValueKind};

/// Translates typed values and documents to and from the REST JSON encoding.
#[derive(Clone, Debug)]
pub struct JsonProtoSerializer {
    database_id: DatabaseId,
}

impl JsonProtoSerializer {
    pub fn new(database_id: DatabaseId) -> Self {
        Self { database_id }
    }

    pub fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    pub fn document_name(&self, key: &DocumentKey) -> String {
        key.name(&self.database_id)
    }

    pub fn encode_document_fields(&self, map: &MapValue) -> JsonValue {
        json!({
            "fields": encode_map_fields(map)
        })
    }

    pub fn encode_value(&self, value: &FirestoreValue) -> JsonValue {
        encode_value(value)
    }

    /// Commit body applying a single server-side increment to `field`.
    pub fn encode_increment_body(
        &self,
        key: &DocumentKey,
        field: &FieldPath,
        operand: &FirestoreValue,
    ) -> JsonValue {
        json!({
            "writes": [{
                "transform": {
                    "document": self.document_name(key),
                    "fieldTransforms": [{
                        "fieldPath": field.server_format(),
                        "increment": encode_value(operand)
                    }]
                }
            }]
        })
    }

    pub fn decode_value(&self, value: &JsonValue) -> FirestoreResult<FirestoreValue> {
        decode_value(value)
    }

    /// Decodes a `Document` resource.
    ///
    /// Fields that fail to decode are dropped and logged so the remaining
    /// fields stay readable.
    pub fn decode_document(&self, value: &JsonValue) -> FirestoreResult<Document> {
        let name = value
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| transport_error("Document in response is missing its 'name'"))?;

        let mut fields = IndexMap::new();
        match value.get("fields") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Object(entries)) => {
                for (key, raw) in entries {
                    match decode_value(raw) {
                        Ok(decoded) => {
                            fields.insert(key.clone(), decoded);
                        }
                        Err(err) => {
                            log::warn!("dropping field '{key}' of {name}: {err}");
                        }
                    }
                }
            }
            Some(other) => {
                log::warn!("ignoring non-object 'fields' of {name}: {other}");
            }
        }

        let create_time = decode_optional_timestamp(value.get("createTime"));
        let update_time = decode_optional_timestamp(value.get("updateTime"));
        Ok(Document::new(name.to_string(), fields, create_time, update_time))
    }
}

fn encode_map_fields(map: &MapValue) -> JsonValue {
    let mut fields = serde_json::Map::new();
    for (key, value) in map.fields() {
        fields.insert(key.clone(), encode_value(value));
    }
    JsonValue::Object(fields)
}

fn encode_value(value: &FirestoreValue) -> JsonValue {
    match value.kind() {
        ValueKind::Null => json!({ "nullValue": JsonValue::Null }),
        ValueKind::Boolean(boolean) => json!({ "booleanValue": boolean }),
        ValueKind::Integer(integer) => json!({ "integerValue": integer.to_string() }),
        ValueKind::Double(double) => json!({ "doubleValue": encode_double(*double) }),
        ValueKind::Timestamp(timestamp) => json!({ "timestampValue": timestamp.to_rfc3339() }),
        ValueKind::String(string) => json!({ "stringValue": string }),
        ValueKind::Reference(reference) => json!({ "referenceValue": reference }),
        ValueKind::Array(array) => {
            let values = array.values().iter().map(encode_value).collect::<Vec<_>>();
            json!({ "arrayValue": { "values": values } })
        }
        ValueKind::Map(map) => json!({
            "mapValue": {
                "fields": encode_map_fields(map)
            }
        }),
    }
}

fn encode_double(value: f64) -> JsonValue {
    if value.is_nan() {
        json!("NaN")
    } else if value == f64::INFINITY {
        json!("Infinity")
    } else if value == f64::NEG_INFINITY {
        json!("-Infinity")
    } else {
        json!(value)
    }
}

/// Decodes one typed value.
///
/// The object must carry exactly one known tag. A tag whose payload is missing
/// or malformed decodes to that kind's zero value. Broken entries nested in an
/// array or map are dropped and the rest of the container is kept.
fn decode_value(value: &JsonValue) -> FirestoreResult<FirestoreValue> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid_argument("Expected Firestore value object"))?;
    let mut entries = object.iter();
    let (tag, payload) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => return Err(invalid_argument("Firestore value has no type tag")),
        (Some(_), Some(_)) => {
            let tags: Vec<_> = object.keys().map(String::as_str).collect();
            return Err(invalid_argument(format!(
                "Firestore value has multiple type tags: {}",
                tags.join(", ")
            )));
        }
    };

    let decoded = match tag.as_str() {
        "nullValue" => FirestoreValue::null(),
        "booleanValue" => FirestoreValue::from_bool(payload.as_bool().unwrap_or_else(|| {
            log_fallback(tag, payload);
            false
        })),
        "integerValue" => FirestoreValue::from_integer(decode_integer(payload).unwrap_or_else(|| {
            log_fallback(tag, payload);
            0
        })),
        "doubleValue" => FirestoreValue::from_double(decode_double(payload).unwrap_or_else(|| {
            log_fallback(tag, payload);
            0.0
        })),
        "timestampValue" => FirestoreValue::from_timestamp(
            payload
                .as_str()
                .and_then(|raw| Timestamp::parse_rfc3339(raw).ok())
                .unwrap_or_else(|| {
                    log_fallback(tag, payload);
                    Timestamp::default()
                }),
        ),
        "stringValue" => FirestoreValue::from_string(payload_str(tag, payload)),
        "referenceValue" => FirestoreValue::from_reference(payload_str(tag, payload)),
        "arrayValue" => {
            let mut values = Vec::new();
            if let Some(entries) = payload.get("values").and_then(JsonValue::as_array) {
                for (index, raw) in entries.iter().enumerate() {
                    match decode_value(raw) {
                        Ok(decoded) => values.push(decoded),
                        Err(err) => log::warn!("dropping array element {index}: {err}"),
                    }
                }
            }
            FirestoreValue::from_array(values)
        }
        "mapValue" => {
            let mut fields = IndexMap::new();
            if let Some(entries) = payload.get("fields").and_then(JsonValue::as_object) {
                for (key, raw) in entries {
                    match decode_value(raw) {
                        Ok(decoded) => {
                            fields.insert(key.clone(), decoded);
                        }
                        Err(err) => log::warn!("dropping map entry '{key}': {err}"),
                    }
                }
            }
            FirestoreValue::from_map(fields)
        }
        other => {
            return Err(invalid_argument(format!(
                "Unsupported Firestore value type '{other}'"
            )))
        }
    };
    Ok(decoded)
}

fn decode_integer(payload: &JsonValue) -> Option<i64> {
    match payload {
        JsonValue::String(value) => i64::from_str(value).ok(),
        JsonValue::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn decode_double(payload: &JsonValue) -> Option<f64> {
    match payload {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(value) => match value.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse::<f64>().ok(),
        },
        _ => None,
    }
}

fn payload_str(tag: &str, payload: &JsonValue) -> String {
    match payload.as_str() {
        Some(value) => value.to_string(),
        None => {
            log_fallback(tag, payload);
            String::new()
        }
    }
}

fn log_fallback(tag: &str, payload: &JsonValue) {
    log::debug!("malformed {tag} payload {payload}; using its zero value");
}

fn decode_optional_timestamp(value: Option<&JsonValue>) -> Option<Timestamp> {
    value
        .and_then(JsonValue::as_str)
        .and_then(|raw| Timestamp::parse_rfc3339(raw).ok())
}
