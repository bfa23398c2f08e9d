use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value as JsonValue;

use crate::constants::{EMULATOR_HOST_ENV, FIRESTORE_API_HOST, FIRESTORE_API_VERSION};
use crate::error::{transport_error, FirestoreResult};
use crate::model::DatabaseId;

use super::rpc_error::map_http_error;

/// One REST call, relative to the database's base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
    pub auth_token: Option<String>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            auth_token: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_auth_token(mut self, token: Option<&str>) -> Self {
        self.auth_token = token.map(str::to_string);
        self
    }
}

/// Executes REST calls against the store.
///
/// Implementations perform exactly one HTTP exchange per call and never retry.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Transport: Send + Sync + 'static {
    async fn invoke_json(&self, request: TransportRequest) -> FirestoreResult<JsonValue>;
}

#[derive(Clone, Debug)]
pub struct Connection {
    client: Client,
    base_url: String,
}

#[derive(Clone, Debug)]
pub struct ConnectionBuilder {
    database_id: DatabaseId,
    client: Option<Client>,
    emulator_host: Option<String>,
    base_url: Option<String>,
}

impl ConnectionBuilder {
    pub fn new(database_id: DatabaseId) -> Self {
        Self {
            database_id,
            client: None,
            emulator_host: std::env::var(EMULATOR_HOST_ENV).ok(),
            base_url: None,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Talks plain HTTP to `host` (e.g. `localhost:8080`).
    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    /// Overrides the API origin (`https://firestore.googleapis.com`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> FirestoreResult<Connection> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .build()
                .map_err(|err| transport_error(err.to_string()))?,
        };
        let origin = match (self.base_url, self.emulator_host) {
            (Some(base_url), _) => base_url.trim_end_matches('/').to_string(),
            (None, Some(host)) => format!("http://{host}"),
            (None, None) => FIRESTORE_API_HOST.to_string(),
        };
        let base_url = format!(
            "{origin}/{FIRESTORE_API_VERSION}/{}",
            self.database_id.database_name()
        );
        Ok(Connection { client, base_url })
    }
}

impl Connection {
    pub fn builder(database_id: DatabaseId) -> ConnectionBuilder {
        ConnectionBuilder::new(database_id)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, request: &TransportRequest) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));
        let mut builder = self.client.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = request.auth_token.as_deref() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }
        builder
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Transport for Connection {
    async fn invoke_json(&self, request: TransportRequest) -> FirestoreResult<JsonValue> {
        log::debug!("firestore {} {}", request.method, request.path);
        let response = self
            .build_request(&request)
            .send()
            .await
            .map_err(|err| transport_error(format!("Request to Firestore failed: {err}")))?;
        let status = response.status();
        let text = response.text().await.map_err(|err| {
            transport_error(format!("Failed to read Firestore response: {err}"))
                .with_http_status(status.as_u16())
        })?;

        if !status.is_success() {
            return Err(map_http_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        serde_json::from_str(&text).map_err(|err| {
            transport_error(format!("Unparseable Firestore response: {err}"))
                .with_http_status(status.as_u16())
        })
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::error::FirestoreErrorCode;
    use crate::test_support::start_mock_server;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::panic;

    fn connection_for(server: &httpmock::MockServer) -> Connection {
        Connection::builder(DatabaseId::default("demo"))
            .with_emulator_host(server.address().to_string())
            .build()
            .expect("connection")
    }

    #[test]
    fn base_url_override_trims_trailing_slash() {
        let connection = Connection::builder(DatabaseId::default("demo"))
            .with_base_url("https://firestore.googleapis.com/")
            .build()
            .unwrap();
        assert_eq!(
            connection.base_url(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)"
        );
    }

    #[tokio::test]
    async fn attaches_bearer_token_and_query() {
        let server = match panic::catch_unwind(start_mock_server) {
            Ok(server) => server,
            Err(_) => {
                eprintln!("Skipping attaches_bearer_token_and_query: unable to bind httpmock server.");
                return;
            }
        };
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/v1/projects/demo/databases/(default)/documents/posts/p1")
                .query_param("updateMask.fieldPaths", "title")
                .header("authorization", "Bearer secret")
                .json_body(json!({ "fields": {} }));
            then.status(200).json_body(json!({ "ok": true }));
        });

        let request = TransportRequest::new(Method::PATCH, "documents/posts/p1")
            .with_query("updateMask.fieldPaths", "title")
            .with_body(json!({ "fields": {} }))
            .with_auth_token(Some("secret"));
        let response = connection_for(&server).invoke_json(request).await.unwrap();
        assert_eq!(response, json!({ "ok": true }));
        mock.assert();
    }

    #[tokio::test]
    async fn empty_body_decodes_to_null() {
        let server = match panic::catch_unwind(start_mock_server) {
            Ok(server) => server,
            Err(_) => {
                eprintln!("Skipping empty_body_decodes_to_null: unable to bind httpmock server.");
                return;
            }
        };
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/projects/demo/databases/(default)/documents/posts/p1");
            then.status(200).body("");
        });

        let request = TransportRequest::new(Method::GET, "/documents/posts/p1");
        let response = connection_for(&server).invoke_json(request).await.unwrap();
        assert_eq!(response, JsonValue::Null);
        mock.assert();
    }

    #[tokio::test]
    async fn classifies_failures() {
        let server = match panic::catch_unwind(start_mock_server) {
            Ok(server) => server,
            Err(_) => {
                eprintln!("Skipping classifies_failures: unable to bind httpmock server.");
                return;
            }
        };
        server.mock(|when, then| {
            when.method(GET).path("/v1/projects/demo/databases/(default)/documents/a/denied");
            then.status(403).json_body(json!({
                "error": { "code": 403, "message": "denied", "status": "PERMISSION_DENIED" }
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/v1/projects/demo/databases/(default)/documents/a/garbled");
            then.status(200).body("not json");
        });

        let connection = connection_for(&server);
        let denied = connection
            .invoke_json(TransportRequest::new(Method::GET, "documents/a/denied"))
            .await
            .unwrap_err();
        assert_eq!(denied.code, FirestoreErrorCode::Domain);
        assert_eq!(denied.store_status(), Some("PERMISSION_DENIED"));

        let garbled = connection
            .invoke_json(TransportRequest::new(Method::GET, "documents/a/garbled"))
            .await
            .unwrap_err();
        assert_eq!(garbled.code, FirestoreErrorCode::Transport);
        assert_eq!(garbled.http_status(), Some(200));
    }
}
