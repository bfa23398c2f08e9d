use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{domain_error, not_found, transport_error, FirestoreError};

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleError>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Classifies a non-2xx response.
///
/// 404 becomes `NotFound`; a body carrying a canonical status becomes a
/// `Domain` error with the store's status and message untouched; anything
/// else is a `Transport` error tagged with the HTTP status.
pub fn map_http_error(status: StatusCode, body: &str) -> FirestoreError {
    let payload = extract_error_payload(body);
    let store_status = payload.as_ref().and_then(|payload| payload.status.clone());
    let message = payload
        .and_then(|payload| payload.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback_message(status, body));

    let error = match (status, store_status) {
        (StatusCode::NOT_FOUND, Some(store_status)) => {
            not_found(message).with_store_status(store_status)
        }
        (StatusCode::NOT_FOUND, None) => not_found(message),
        (_, Some(store_status)) => domain_error(store_status, message),
        (_, None) => transport_error(message),
    };
    error.with_http_status(status.as_u16())
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("HTTP error");
    let snippet: String = body.trim().chars().take(200).collect();
    if snippet.is_empty() {
        reason.to_string()
    } else {
        format!("{reason}: {snippet}")
    }
}

/// Error bodies arrive either as an object or, for streamed endpoints such
/// as `runQuery`, wrapped in a one-element array.
fn extract_error_payload(body: &str) -> Option<GoogleError> {
    let parsed: JsonValue = serde_json::from_str(body).ok()?;
    let entries = match parsed {
        JsonValue::Array(entries) => entries,
        object @ JsonValue::Object(_) => vec![object],
        _ => return None,
    };
    entries.into_iter().find_map(|entry| {
        serde_json::from_value::<GoogleErrorBody>(entry)
            .ok()
            .and_then(|parsed| parsed.error)
    })
}
