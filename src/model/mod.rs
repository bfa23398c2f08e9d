mod database_id;
mod document_key;
mod field_path;
mod resource_path;
mod timestamp;

pub use database_id::DatabaseId;
pub use document_key::{extract_id, resolve_path, DocumentKey};
pub(crate) use document_key::validate_collection_path;
pub use field_path::{FieldPath, IntoFieldPath};
pub use resource_path::ResourcePath;
pub use timestamp::Timestamp;
