use serde_json::{json, Value as JsonValue};

use crate::api::query::{Bound, FieldFilter, FilterOperator, QuerySpec};
use crate::error::{invalid_query, FirestoreResult};
use crate::model::{validate_collection_path, ResourcePath};
use crate::remote::serializer::JsonProtoSerializer;
use crate::value::{encode_value, NativeValue};

/// Request path (relative to the database) of the `runQuery` call for `spec`.
///
/// Subcollection queries run under their parent document.
pub fn run_query_path(spec: &QuerySpec) -> FirestoreResult<String> {
    let collection = collection_path(spec)?;
    let parent = collection.without_last();
    if parent.is_empty() {
        Ok("documents:runQuery".to_string())
    } else {
        Ok(format!("documents/{}:runQuery", parent.url_encoded()))
    }
}

/// Compiles `spec` into a `StructuredQuery` JSON object.
///
/// Validation and literal encoding happen here, so a rejected query never
/// reaches the network. Identical specs produce identical output.
pub fn encode_structured_query(
    serializer: &JsonProtoSerializer,
    spec: &QuerySpec,
) -> FirestoreResult<JsonValue> {
    let collection = collection_path(spec)?;
    validate_limits(spec)?;

    let mut structured = serde_json::Map::new();
    structured.insert(
        "from".to_string(),
        json!([{ "collectionId": collection.last_segment().unwrap_or_default() }]),
    );

    if !spec.filters().is_empty() {
        structured.insert(
            "where".to_string(),
            encode_filters(serializer, spec.filters())?,
        );
    }

    if !spec.order_by().is_empty() {
        let orders: Vec<_> = spec
            .order_by()
            .iter()
            .map(|order| {
                json!({
                    "field": { "fieldPath": order.field().server_format() },
                    "direction": order.direction().as_str(),
                })
            })
            .collect();
        structured.insert("orderBy".to_string(), JsonValue::Array(orders));
    }

    if let Some(start) = spec.start_at() {
        structured.insert(
            "startAt".to_string(),
            encode_cursor(serializer, spec, start, true)?,
        );
    }

    if let Some(end) = spec.end_at() {
        structured.insert(
            "endAt".to_string(),
            encode_cursor(serializer, spec, end, false)?,
        );
    }

    if let Some(offset) = spec.offset() {
        structured.insert("offset".to_string(), json!(offset));
    }

    if let Some(limit) = spec.limit() {
        structured.insert("limit".to_string(), json!(limit));
    }

    Ok(JsonValue::Object(structured))
}

fn collection_path(spec: &QuerySpec) -> FirestoreResult<ResourcePath> {
    validate_collection_path(spec.collection()).map_err(|err| invalid_query(err.message()))
}

fn validate_limits(spec: &QuerySpec) -> FirestoreResult<()> {
    if let Some(limit) = spec.limit() {
        if limit <= 0 {
            return Err(invalid_query(format!(
                "Query limit must be a positive number, got {limit}"
            )));
        }
        if limit > i64::from(i32::MAX) {
            return Err(invalid_query(format!("Query limit {limit} is too large")));
        }
    }
    if let Some(offset) = spec.offset() {
        if !(0..=i64::from(i32::MAX)).contains(&offset) {
            return Err(invalid_query(format!("Query offset {offset} is out of range")));
        }
    }
    Ok(())
}

fn encode_filters(
    serializer: &JsonProtoSerializer,
    filters: &[FieldFilter],
) -> FirestoreResult<JsonValue> {
    if filters.len() == 1 {
        return encode_field_filter(serializer, &filters[0]);
    }

    let nested = filters
        .iter()
        .map(|filter| encode_field_filter(serializer, filter))
        .collect::<FirestoreResult<Vec<_>>>()?;

    Ok(json!({
        "compositeFilter": {
            "op": "AND",
            "filters": nested
        }
    }))
}

fn encode_field_filter(
    serializer: &JsonProtoSerializer,
    filter: &FieldFilter,
) -> FirestoreResult<JsonValue> {
    let field_path = filter.field().server_format();
    if let Some(op) = unary_operator(filter) {
        return Ok(json!({
            "unaryFilter": {
                "op": op,
                "field": { "fieldPath": field_path }
            }
        }));
    }

    if matches!(
        filter.operator(),
        FilterOperator::In | FilterOperator::NotIn | FilterOperator::ArrayContainsAny
    ) {
        match filter.value() {
            NativeValue::Array(values) if !values.is_empty() => {}
            _ => {
                return Err(invalid_query(format!(
                    "'{}' filters on '{}' require a non-empty array",
                    filter.operator().as_str(),
                    filter.field().canonical_string()
                )))
            }
        }
    }

    let value = encode_value(filter.value())?;
    Ok(json!({
        "fieldFilter": {
            "field": { "fieldPath": field_path },
            "op": filter.operator().as_str(),
            "value": serializer.encode_value(&value)
        }
    }))
}

/// `== null` and `== NaN` (and their negations) must be sent as unary filters.
fn unary_operator(filter: &FieldFilter) -> Option<&'static str> {
    let is_nan = matches!(filter.value(), NativeValue::Double(value) if value.is_nan());
    match (filter.operator(), filter.value()) {
        (FilterOperator::Equal, NativeValue::Null) => Some("IS_NULL"),
        (FilterOperator::NotEqual, NativeValue::Null) => Some("IS_NOT_NULL"),
        (FilterOperator::Equal, _) if is_nan => Some("IS_NAN"),
        (FilterOperator::NotEqual, _) if is_nan => Some("IS_NOT_NAN"),
        _ => None,
    }
}

fn encode_cursor(
    serializer: &JsonProtoSerializer,
    spec: &QuerySpec,
    bound: &Bound,
    start: bool,
) -> FirestoreResult<JsonValue> {
    if bound.values().len() > spec.order_by().len() {
        return Err(invalid_query(
            "Too many cursor values; a cursor may not have more values than orderBy fields",
        ));
    }
    let values = bound
        .values()
        .iter()
        .map(|value| encode_value(value).map(|encoded| serializer.encode_value(&encoded)))
        .collect::<FirestoreResult<Vec<_>>>()?;
    Ok(json!({
        "values": values,
        "before": if start { bound.inclusive() } else { !bound.inclusive() },
    }))
}
