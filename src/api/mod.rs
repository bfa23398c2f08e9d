pub mod document;
pub mod operations;
pub mod query;
pub mod snapshot;

pub use document::{FirestoreClient, FirestoreClientBuilder};
pub use query::{
    Bound, FieldFilter, FilterOperator, ListOptions, OrderBy, OrderDirection, PageRequest,
    QueryOptions, QuerySpec,
};
pub use snapshot::{Document, DocumentPage};
