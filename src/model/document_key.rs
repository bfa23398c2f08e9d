use crate::error::{invalid_argument, FirestoreResult};
use crate::model::{DatabaseId, ResourcePath};

/// Joins a resource root, a collection path and a document id with `/`.
///
/// Ids are not escaped; [`DocumentKey::new`] rejects ids containing `/`.
pub fn resolve_path(root: &str, collection: &str, id: &str) -> String {
    let root = root.trim_end_matches('/');
    let collection = collection.trim_matches('/');
    if root.is_empty() {
        format!("{collection}/{id}")
    } else {
        format!("{root}/{collection}/{id}")
    }
}

/// Returns the final segment of a resource path.
pub fn extract_id(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Location of a single document: the collection it lives in plus its id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    collection: ResourcePath,
    id: String,
}

impl DocumentKey {
    pub fn new(collection: &str, id: &str) -> FirestoreResult<Self> {
        let collection = validate_collection_path(collection)?;
        validate_document_id(id)?;
        Ok(Self {
            collection,
            id: id.to_string(),
        })
    }

    /// Parses a fully-qualified resource name returned by the store.
    pub fn from_name(database_id: &DatabaseId, name: &str) -> FirestoreResult<Self> {
        let prefix = format!("{}/", database_id.documents_root());
        let relative = name.strip_prefix(&prefix).ok_or_else(|| {
            invalid_argument(format!(
                "Unexpected document name '{name}' for database {}",
                database_id.database_name()
            ))
        })?;
        let path = ResourcePath::from_string(relative)?;
        if path.len() < 2 || path.len() % 2 != 0 {
            return Err(invalid_argument(format!(
                "Resource name '{name}' does not point to a document"
            )));
        }
        let id = path.last_segment().unwrap_or_default().to_string();
        Ok(Self {
            collection: path.without_last(),
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collection_path(&self) -> &ResourcePath {
        &self.collection
    }

    /// Path relative to the documents root (`cities/sf`).
    pub fn path(&self) -> ResourcePath {
        self.collection.child([self.id.as_str()])
    }

    /// Fully-qualified resource name understood by the store.
    pub fn name(&self, database_id: &DatabaseId) -> String {
        resolve_path(
            &database_id.documents_root(),
            &self.collection.canonical_string(),
            &self.id,
        )
    }
}

pub(crate) fn validate_collection_path(collection: &str) -> FirestoreResult<ResourcePath> {
    let path = ResourcePath::from_string(collection)?;
    if path.is_empty() || path.len() % 2 == 0 {
        return Err(invalid_argument(format!(
            "'{collection}' is not a collection path (odd number of segments)"
        )));
    }
    Ok(path)
}

fn validate_document_id(id: &str) -> FirestoreResult<()> {
    if id.is_empty() {
        return Err(invalid_argument("Document ID cannot be empty."));
    }
    if id.contains('/') {
        return Err(invalid_argument("Document ID cannot contain '/'."));
    }
    if id == "." || id == ".." {
        return Err(invalid_argument("Document ID cannot be '.' or '..'."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_then_extract_returns_id() {
        let root = DatabaseId::default("demo").documents_root();
        for (collection, id) in [("posts", "abc"), ("users/u1/likes", "p-9"), ("c", "has space")] {
            let path = resolve_path(&root, collection, id);
            assert_eq!(extract_id(&path), id);
        }
    }

    #[test]
    fn extract_id_without_separator() {
        assert_eq!(extract_id("lonely"), "lonely");
        assert_eq!(extract_id(""), "");
    }

    #[test]
    fn rejects_composite_ids() {
        let err = DocumentKey::new("posts", "a/b").unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
        assert!(DocumentKey::new("posts", "").is_err());
    }

    #[test]
    fn rejects_document_paths_as_collections() {
        assert!(DocumentKey::new("users/u1", "x").is_err());
        assert!(DocumentKey::new("", "x").is_err());
    }

    #[test]
    fn name_round_trips_through_from_name() {
        let db = DatabaseId::default("demo");
        let key = DocumentKey::new("users/u1/posts", "p1").unwrap();
        let name = key.name(&db);
        assert_eq!(
            name,
            "projects/demo/databases/(default)/documents/users/u1/posts/p1"
        );
        let parsed = DocumentKey::from_name(&db, &name).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.path().canonical_string(), "users/u1/posts/p1");
    }

    #[test]
    fn from_name_rejects_foreign_database() {
        let db = DatabaseId::default("demo");
        let err = DocumentKey::from_name(&db, "projects/other/databases/(default)/documents/a/b")
            .unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
    }
}
