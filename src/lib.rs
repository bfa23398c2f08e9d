//! Typed-document client for the Cloud Firestore v1 REST API.
//!
//! Documents are addressed by collection path and id, and written as maps of
//! [`NativeValue`]s that are encoded into the store's tagged value format
//! before any request is made. Reads return [`Document`] snapshots whose
//! `get_*` accessors fall back to zero values for absent fields.
//!
//! ```no_run
//! use firestore_rest::{DatabaseId, FirestoreClient, FilterOperator, NativeValue, QueryOptions};
//! use indexmap::IndexMap;
//!
//! # async fn run(token: &str) -> firestore_rest::FirestoreResult<()> {
//! let client = FirestoreClient::new(DatabaseId::default("my-project"))?;
//!
//! let mut fields = IndexMap::new();
//! fields.insert("title".to_string(), NativeValue::from("Hello"));
//! fields.insert("likes".to_string(), NativeValue::from(0));
//! let post = client.create("posts", fields, Some(token)).await?;
//!
//! let popular = client
//!     .query(
//!         "posts",
//!         QueryOptions::new()
//!             .where_field("likes", FilterOperator::GreaterThan, 10)?
//!             .limit(20),
//!         Some(token),
//!     )
//!     .await?;
//! println!("{} has {} popular siblings", post.id(), popular.len());
//! # Ok(())
//! # }
//! ```

mod constants;

pub mod api;
pub mod error;
pub mod model;
pub mod remote;
pub mod value;

pub use api::{
    Document, DocumentPage, FieldFilter, FilterOperator, FirestoreClient, FirestoreClientBuilder,
    ListOptions, OrderBy, OrderDirection, PageRequest, QueryOptions,
};
pub use constants::DEFAULT_DATABASE_ID;
pub use error::{require_token, FirestoreError, FirestoreErrorCode, FirestoreResult};
pub use model::{DatabaseId, DocumentKey, FieldPath, Timestamp};
pub use remote::{Connection, Transport, TransportRequest};
pub use value::{FirestoreValue, NativeValue, ValueKind};

#[cfg(test)]
pub(crate) mod test_support;
