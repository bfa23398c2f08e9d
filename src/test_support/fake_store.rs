use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use reqwest::Method;
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{domain_error, invalid_argument, not_found, FirestoreResult};
use crate::model::DatabaseId;
use crate::remote::connection::{Transport, TransportRequest};

type Fields = Map<String, JsonValue>;

#[derive(Default)]
struct FakeState {
    documents: IndexMap<String, Fields>,
    requests: Vec<TransportRequest>,
    next_id: u64,
}

/// In-memory stand-in for the REST endpoints.
///
/// Records every request, applies update masks and increment transforms, and
/// evaluates equality filters, which is enough to observe client behaviour
/// without a network.
pub struct FakeStore {
    database_id: DatabaseId,
    state: Mutex<FakeState>,
}

impl FakeStore {
    pub fn new(database_id: DatabaseId) -> Arc<Self> {
        Arc::new(Self {
            database_id,
            state: Mutex::new(FakeState::default()),
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    fn document_json(&self, path: &str, fields: &Fields) -> JsonValue {
        json!({
            "name": format!("{}/{}", self.database_id.documents_root(), path),
            "fields": fields,
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z",
        })
    }

    fn dispatch(&self, state: &mut FakeState, request: &TransportRequest) -> FirestoreResult<JsonValue> {
        let rest = request
            .path
            .trim_start_matches('/')
            .strip_prefix("documents")
            .ok_or_else(|| invalid_argument(format!("unexpected path {}", request.path)))?;

        if rest == ":commit" {
            return self.commit(state, request);
        }
        if let Some(parent) = rest.strip_suffix(":runQuery") {
            return self.run_query(state, &decode_path(parent), request);
        }

        let path = decode_path(rest);
        let is_document = path.split('/').count() % 2 == 0;
        let method = &request.method;
        if *method == Method::GET && is_document {
            state
                .documents
                .get(&path)
                .map(|fields| self.document_json(&path, fields))
                .ok_or_else(|| not_found(format!("No document at {path}")))
        } else if *method == Method::GET {
            Ok(self.list_page(state, &path, request))
        } else if *method == Method::POST && !is_document {
            self.create(state, &path, request)
        } else if *method == Method::PATCH && is_document {
            Ok(self.patch(state, &path, request))
        } else if *method == Method::DELETE && is_document {
            state
                .documents
                .shift_remove(&path)
                .map(|_| JsonValue::Object(Map::new()))
                .ok_or_else(|| not_found(format!("No document at {path}")))
        } else {
            Err(invalid_argument(format!(
                "unsupported {} {}",
                request.method, request.path
            )))
        }
    }

    fn create(&self, state: &mut FakeState, collection: &str, request: &TransportRequest) -> FirestoreResult<JsonValue> {
        let id = match query_values(request, "documentId").first() {
            Some(id) => id.to_string(),
            None => {
                state.next_id += 1;
                format!("auto{:04}", state.next_id)
            }
        };
        let path = format!("{collection}/{id}");
        if state.documents.contains_key(&path) {
            return Err(domain_error("ALREADY_EXISTS", format!("Document already exists: {path}")));
        }
        let fields = body_fields(request);
        let response = self.document_json(&path, &fields);
        state.documents.insert(path, fields);
        Ok(response)
    }

    fn patch(&self, state: &mut FakeState, path: &str, request: &TransportRequest) -> JsonValue {
        let incoming = body_fields(request);
        let mask = query_values(request, "updateMask.fieldPaths");
        let stored = state.documents.entry(path.to_string()).or_default();
        if mask.is_empty() {
            *stored = incoming;
        } else {
            for field in mask {
                let field = unquote(field);
                match incoming.get(&field) {
                    Some(value) => {
                        stored.insert(field, value.clone());
                    }
                    None => {
                        stored.remove(&field);
                    }
                }
            }
        }
        let fields = stored.clone();
        self.document_json(path, &fields)
    }

    fn list_page(&self, state: &FakeState, collection: &str, request: &TransportRequest) -> JsonValue {
        let start = query_values(request, "pageToken")
            .first()
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(0);
        let size = query_values(request, "pageSize")
            .first()
            .and_then(|size| size.parse::<usize>().ok())
            .unwrap_or(usize::MAX);
        let matching: Vec<_> = state
            .documents
            .iter()
            .filter(|(path, _)| parent_of(path) == collection)
            .collect();

        let mut response = Map::new();
        let page: Vec<_> = matching
            .iter()
            .skip(start)
            .take(size)
            .map(|(path, fields)| self.document_json(path, fields))
            .collect();
        let end = start.saturating_add(page.len());
        if !page.is_empty() {
            response.insert("documents".to_string(), JsonValue::Array(page));
        }
        if end < matching.len() {
            response.insert("nextPageToken".to_string(), json!(end.to_string()));
        }
        JsonValue::Object(response)
    }

    fn run_query(&self, state: &FakeState, parent: &str, request: &TransportRequest) -> FirestoreResult<JsonValue> {
        let query = request
            .body
            .as_ref()
            .and_then(|body| body.get("structuredQuery"))
            .ok_or_else(|| invalid_argument("runQuery without structuredQuery"))?;
        let collection_id = query
            .pointer("/from/0/collectionId")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let collection = if parent.is_empty() {
            collection_id.to_string()
        } else {
            format!("{parent}/{collection_id}")
        };
        let offset = query.get("offset").and_then(JsonValue::as_u64).unwrap_or(0) as usize;
        let limit = query
            .get("limit")
            .and_then(JsonValue::as_u64)
            .map(|limit| limit as usize)
            .unwrap_or(usize::MAX);

        let mut entries = Vec::new();
        for (path, fields) in &state.documents {
            if parent_of(path) != collection {
                continue;
            }
            if let Some(filter) = query.get("where") {
                if !matches_filter(filter, fields)? {
                    continue;
                }
            }
            entries.push(json!({ "document": self.document_json(path, fields) }));
        }
        let mut entries: Vec<_> = entries.into_iter().skip(offset).take(limit).collect();
        entries.push(json!({ "readTime": "2024-01-01T00:00:00Z" }));
        Ok(JsonValue::Array(entries))
    }

    fn commit(&self, state: &mut FakeState, request: &TransportRequest) -> FirestoreResult<JsonValue> {
        let root = format!("{}/", self.database_id.documents_root());
        let writes = request
            .body
            .as_ref()
            .and_then(|body| body.get("writes"))
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();
        for write in writes {
            let transform = write
                .get("transform")
                .ok_or_else(|| invalid_argument("only transform writes are supported"))?;
            let name = transform.get("document").and_then(JsonValue::as_str).unwrap_or_default();
            let path = name
                .strip_prefix(&root)
                .ok_or_else(|| invalid_argument(format!("foreign document {name}")))?
                .to_string();
            let stored = state.documents.entry(path).or_default();
            let transforms = transform
                .get("fieldTransforms")
                .and_then(JsonValue::as_array)
                .cloned()
                .unwrap_or_default();
            for field_transform in transforms {
                let field = unquote(
                    field_transform
                        .get("fieldPath")
                        .and_then(JsonValue::as_str)
                        .unwrap_or_default(),
                );
                let operand = field_transform.get("increment").cloned().unwrap_or(JsonValue::Null);
                let current = stored.get(&field).cloned().unwrap_or(json!({ "integerValue": "0" }));
                stored.insert(field, add_numbers(&current, &operand));
            }
        }
        Ok(json!({ "writeResults": [{}], "commitTime": "2024-01-01T00:00:00Z" }))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Transport for FakeStore {
    async fn invoke_json(&self, request: TransportRequest) -> FirestoreResult<JsonValue> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        self.dispatch(&mut state, &request)
    }
}

fn decode_path(raw: &str) -> String {
    percent_decode_str(raw.trim_start_matches('/'))
        .decode_utf8_lossy()
        .into_owned()
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

fn query_values<'a>(request: &'a TransportRequest, key: &str) -> Vec<&'a str> {
    request
        .query
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
        .collect()
}

fn body_fields(request: &TransportRequest) -> Fields {
    request
        .body
        .as_ref()
        .and_then(|body| body.get("fields"))
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default()
}

fn unquote(field: &str) -> String {
    match field.strip_prefix('`').and_then(|inner| inner.strip_suffix('`')) {
        Some(inner) => inner.replace("\\`", "`").replace("\\\\", "\\"),
        None => field.to_string(),
    }
}

fn matches_filter(filter: &JsonValue, fields: &Fields) -> FirestoreResult<bool> {
    if let Some(composite) = filter.get("compositeFilter") {
        let filters = composite
            .get("filters")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();
        for nested in &filters {
            if !matches_filter(nested, fields)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if let Some(field_filter) = filter.get("fieldFilter") {
        let op = field_filter.get("op").and_then(JsonValue::as_str).unwrap_or_default();
        let field = unquote(
            field_filter
                .pointer("/field/fieldPath")
                .and_then(JsonValue::as_str)
                .unwrap_or_default(),
        );
        let expected = field_filter.get("value");
        return match op {
            "EQUAL" => Ok(fields.get(&field) == expected),
            "NOT_EQUAL" => Ok(fields.contains_key(&field) && fields.get(&field) != expected),
            other => Err(invalid_argument(format!("fake store cannot evaluate {other}"))),
        };
    }
    Err(invalid_argument(format!("fake store cannot evaluate {filter}")))
}

fn add_numbers(current: &JsonValue, operand: &JsonValue) -> JsonValue {
    let as_integer = |value: &JsonValue| {
        value
            .get("integerValue")
            .and_then(JsonValue::as_str)
            .and_then(|raw| raw.parse::<i64>().ok())
    };
    let as_double = |value: &JsonValue| {
        value
            .get("doubleValue")
            .and_then(JsonValue::as_f64)
            .or_else(|| as_integer(value).map(|integer| integer as f64))
    };
    match (as_integer(current), as_integer(operand)) {
        (Some(left), Some(right)) => json!({ "integerValue": left.saturating_add(right).to_string() }),
        _ => json!({
            "doubleValue": as_double(current).unwrap_or(0.0) + as_double(operand).unwrap_or(0.0)
        }),
    }
}
