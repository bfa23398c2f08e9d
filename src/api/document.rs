use std::sync::Arc;

use indexmap::IndexMap;
use reqwest::Method;
use serde_json::{json, Value as JsonValue};

use crate::api::operations::{encode_list_order, encode_patch_data};
use crate::api::query::{ListOptions, PageRequest, QueryOptions, QuerySpec};
use crate::api::snapshot::{Document, DocumentPage};
use crate::error::{
    domain_error, invalid_argument, transport_error, FirestoreError, FirestoreErrorCode, FirestoreResult,
};
use crate::model::{validate_collection_path, DatabaseId, DocumentKey, IntoFieldPath};
use crate::remote::connection::{Connection, ConnectionBuilder, Transport, TransportRequest};
use crate::remote::serializer::JsonProtoSerializer;
use crate::remote::structured_query::{encode_structured_query, run_query_path};
use crate::value::{encode_fields, encode_value, NativeValue, ValueKind};

/// Async client for single-document reads and writes plus collection queries.
///
/// Every operation issues exactly one HTTP request and takes the caller's
/// bearer token explicitly. Values are encoded and queries compiled before the
/// request is built, so invalid input never reaches the network.
///
/// Writes are independent: reading a document, changing a field locally and
/// then calling [`FirestoreClient::patch`] can lose concurrent updates. Use
/// [`FirestoreClient::increment`] for counters that must not race.
#[derive(Clone)]
pub struct FirestoreClient {
    serializer: JsonProtoSerializer,
    transport: Arc<dyn Transport>,
}

pub struct FirestoreClientBuilder {
    database_id: DatabaseId,
    connection: ConnectionBuilder,
    transport: Option<Arc<dyn Transport>>,
}

impl FirestoreClientBuilder {
    pub fn new(database_id: DatabaseId) -> Self {
        Self {
            connection: Connection::builder(database_id.clone()),
            database_id,
            transport: None,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.connection = self.connection.with_client(client);
        self
    }

    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.connection = self.connection.with_emulator_host(host);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.connection = self.connection.with_base_url(base_url);
        self
    }

    /// Replaces the HTTP connection entirely; connection settings are ignored.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> FirestoreResult<FirestoreClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(self.connection.build()?),
        };
        Ok(FirestoreClient::with_transport(self.database_id, transport))
    }
}

impl FirestoreClient {
    pub fn builder(database_id: DatabaseId) -> FirestoreClientBuilder {
        FirestoreClientBuilder::new(database_id)
    }

    /// Client for the production endpoint, or the emulator named by
    /// `FIRESTORE_EMULATOR_HOST`.
    pub fn new(database_id: DatabaseId) -> FirestoreResult<Self> {
        Self::builder(database_id).build()
    }

    pub fn with_transport(database_id: DatabaseId, transport: Arc<dyn Transport>) -> Self {
        Self {
            serializer: JsonProtoSerializer::new(database_id),
            transport,
        }
    }

    pub fn database_id(&self) -> &DatabaseId {
        self.serializer.database_id()
    }

    /// Fetches one document. A missing document is a `NotFound` error.
    pub async fn get(&self, collection: &str, id: &str, token: Option<&str>) -> FirestoreResult<Document> {
        let key = DocumentKey::new(collection, id)?;
        let request = TransportRequest::new(Method::GET, document_path(&key)).with_auth_token(token);
        let response = self.transport.invoke_json(request).await?;
        self.serializer.decode_document(&response)
    }

    /// Returns every document of `collection`, optionally ordered and capped.
    pub async fn list(
        &self,
        collection: &str,
        options: ListOptions,
        token: Option<&str>,
    ) -> FirestoreResult<Vec<Document>> {
        self.run_query(QuerySpec::new(collection, options), token).await
    }

    /// Runs a filtered query; all filters must hold.
    pub async fn query(
        &self,
        collection: &str,
        options: QueryOptions,
        token: Option<&str>,
    ) -> FirestoreResult<Vec<Document>> {
        self.run_query(QuerySpec::new(collection, options), token).await
    }

    /// Fetches one page of `collection` through the list-documents endpoint.
    pub async fn list_page(
        &self,
        collection: &str,
        page: PageRequest,
        token: Option<&str>,
    ) -> FirestoreResult<DocumentPage> {
        let path = validate_collection_path(collection)?;
        if let Some(size) = page.page_size {
            if size <= 0 {
                return Err(invalid_argument(format!("page_size must be positive, got {size}")));
            }
        }

        let mut request = TransportRequest::new(Method::GET, format!("documents/{}", path.url_encoded()))
            .with_auth_token(token);
        if let Some(size) = page.page_size {
            request = request.with_query("pageSize", size.to_string());
        }
        if let Some(page_token) = page.page_token {
            request = request.with_query("pageToken", page_token);
        }
        if let Some(order) = encode_list_order(&page.order_by) {
            request = request.with_query("orderBy", order);
        }

        let response = self.transport.invoke_json(request).await?;
        let documents = match response.get("documents") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(entries)) => entries
                .iter()
                .map(|entry| self.serializer.decode_document(entry))
                .collect::<FirestoreResult<Vec<_>>>()?,
            Some(other) => {
                return Err(transport_error(format!("Unexpected 'documents' payload: {other}")));
            }
        };
        let next_page_token = response
            .get("nextPageToken")
            .and_then(JsonValue::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        Ok(DocumentPage {
            documents,
            next_page_token,
        })
    }

    /// Creates a document with a store-assigned id.
    pub async fn create(
        &self,
        collection: &str,
        fields: IndexMap<String, NativeValue>,
        token: Option<&str>,
    ) -> FirestoreResult<Document> {
        let path = validate_collection_path(collection)?;
        let map = encode_fields(&fields)?;
        let request = TransportRequest::new(Method::POST, format!("documents/{}", path.url_encoded()))
            .with_body(self.serializer.encode_document_fields(&map))
            .with_auth_token(token);
        let response = self.transport.invoke_json(request).await?;
        self.serializer.decode_document(&response)
    }

    /// Creates a document under a caller-chosen id; fails if it already exists.
    pub async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        fields: IndexMap<String, NativeValue>,
        token: Option<&str>,
    ) -> FirestoreResult<Document> {
        let key = DocumentKey::new(collection, id)?;
        let map = encode_fields(&fields)?;
        let request = TransportRequest::new(
            Method::POST,
            format!("documents/{}", key.collection_path().url_encoded()),
        )
        .with_query("documentId", key.id())
        .with_body(self.serializer.encode_document_fields(&map))
        .with_auth_token(token);
        let response = self.transport.invoke_json(request).await?;
        self.serializer.decode_document(&response)
    }

    /// Writes only the supplied fields, leaving the rest of the document as is.
    ///
    /// Creates the document when it does not exist yet. Each key names a
    /// top-level field.
    pub async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: IndexMap<String, NativeValue>,
        token: Option<&str>,
    ) -> FirestoreResult<Document> {
        let key = DocumentKey::new(collection, id)?;
        let encoded = encode_patch_data(&fields)?;
        let mut request = TransportRequest::new(Method::PATCH, document_path(&key))
            .with_body(self.serializer.encode_document_fields(&encoded.map))
            .with_auth_token(token);
        for (name, value) in encoded.mask_query() {
            request = request.with_query(name, value);
        }
        let response = self.transport.invoke_json(request).await?;
        self.serializer.decode_document(&response)
    }

    /// Deletes a document. Deleting a missing document succeeds.
    pub async fn delete(&self, collection: &str, id: &str, token: Option<&str>) -> FirestoreResult<()> {
        let key = DocumentKey::new(collection, id)?;
        let request = TransportRequest::new(Method::DELETE, document_path(&key)).with_auth_token(token);
        match self.transport.invoke_json(request).await {
            Ok(_) => Ok(()),
            Err(err) if err.code == FirestoreErrorCode::NotFound => {
                log::debug!("delete of missing document {}/{}", collection, id);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Atomically adds `by` to a numeric field on the server.
    ///
    /// A missing field or document starts from zero.
    pub async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: impl IntoFieldPath,
        by: impl Into<NativeValue>,
        token: Option<&str>,
    ) -> FirestoreResult<()> {
        let key = DocumentKey::new(collection, id)?;
        let field = field.into_field_path()?;
        let operand = encode_value(&by.into())?;
        if !matches!(operand.kind(), ValueKind::Integer(_) | ValueKind::Double(_)) {
            return Err(invalid_argument(format!(
                "increment requires a numeric operand, got {}",
                operand.kind().tag()
            )));
        }
        let body = self.serializer.encode_increment_body(&key, &field, &operand);
        let request = TransportRequest::new(Method::POST, "documents:commit")
            .with_body(body)
            .with_auth_token(token);
        self.transport.invoke_json(request).await?;
        Ok(())
    }

    async fn run_query(&self, spec: QuerySpec, token: Option<&str>) -> FirestoreResult<Vec<Document>> {
        let path = run_query_path(&spec)?;
        let structured = encode_structured_query(&self.serializer, &spec)?;
        let request = TransportRequest::new(Method::POST, path)
            .with_body(json!({ "structuredQuery": structured }))
            .with_auth_token(token);
        let response = self
            .transport
            .invoke_json(request)
            .await
            .map_err(query_error)?;

        let entries = match response {
            JsonValue::Null => return Ok(Vec::new()),
            JsonValue::Array(entries) => entries,
            other => {
                return Err(transport_error(format!("Unexpected runQuery response: {other}")));
            }
        };
        // Entries without a document carry only read-time progress.
        entries
            .iter()
            .filter_map(|entry| entry.get("document"))
            .map(|document| self.serializer.decode_document(document))
            .collect()
    }
}

/// A 404 from `runQuery` means the database or parent is missing, never an
/// absent document, so it is reported as a store error.
fn query_error(err: FirestoreError) -> FirestoreError {
    if err.code != FirestoreErrorCode::NotFound {
        return err;
    }
    let status = err.store_status().unwrap_or("NOT_FOUND").to_string();
    let mapped = domain_error(status, err.message());
    match err.http_status() {
        Some(http_status) => mapped.with_http_status(http_status),
        None => mapped,
    }
}

fn document_path(key: &DocumentKey) -> String {
    format!("documents/{}", key.path().url_encoded())
}
