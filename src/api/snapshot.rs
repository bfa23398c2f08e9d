use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::FirestoreResult;
use crate::model::{extract_id, Timestamp};
use crate::value::{decode_fields, extract, FirestoreValue, NativeValue};

/// Immutable snapshot of a stored document.
///
/// Fields stay in their typed form; the `get_*` accessors decode one field at
/// a time and substitute a zero value when the field is absent.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    name: String,
    fields: IndexMap<String, FirestoreValue>,
    create_time: Option<Timestamp>,
    update_time: Option<Timestamp>,
}

impl Document {
    pub fn new(
        name: String,
        fields: IndexMap<String, FirestoreValue>,
        create_time: Option<Timestamp>,
        update_time: Option<Timestamp>,
    ) -> Self {
        Self {
            name,
            fields,
            create_time,
            update_time,
        }
    }

    /// Full resource name assigned by the store.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        extract_id(&self.name)
    }

    pub fn fields(&self) -> &IndexMap<String, FirestoreValue> {
        &self.fields
    }

    pub fn field(&self, field: &str) -> Option<&FirestoreValue> {
        extract::lookup(&self.fields, field)
    }

    pub fn create_time(&self) -> Option<Timestamp> {
        self.create_time
    }

    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }

    pub fn get_string(&self, field: &str) -> String {
        extract::string(&self.fields, field)
    }

    pub fn get_i64(&self, field: &str) -> i64 {
        extract::integer(&self.fields, field)
    }

    pub fn get_f64(&self, field: &str) -> f64 {
        extract::double(&self.fields, field)
    }

    pub fn get_bool(&self, field: &str) -> bool {
        extract::boolean(&self.fields, field)
    }

    pub fn get_timestamp(&self, field: &str) -> Option<Timestamp> {
        extract::timestamp(&self.fields, field)
    }

    pub fn get_array(&self, field: &str) -> Vec<NativeValue> {
        extract::array(&self.fields, field)
    }

    pub fn get_map(&self, field: &str) -> IndexMap<String, NativeValue> {
        extract::map(&self.fields, field)
    }

    pub fn get(&self, field: &str) -> NativeValue {
        extract::value(&self.fields, field)
    }

    /// All fields decoded to native values.
    pub fn to_native(&self) -> IndexMap<String, NativeValue> {
        decode_fields(&self.fields)
    }

    /// Deserializes the decoded fields into `T`.
    pub fn deserialize<T>(&self) -> FirestoreResult<T>
    where
        T: DeserializeOwned,
    {
        NativeValue::Map(self.to_native()).deserialize_into()
    }
}

/// One page returned by `FirestoreClient::list_page`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    /// Present while more documents remain.
    pub next_page_token: Option<String>,
}

impl DocumentPage {
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}
