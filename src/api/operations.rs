use indexmap::IndexMap;

use crate::error::{invalid_argument, FirestoreResult};
use crate::model::FieldPath;
use crate::value::{encode_fields, MapValue, NativeValue};

use super::query::{OrderBy, OrderDirection};

/// Pre-encoded data for `patch` writes.
#[derive(Clone, Debug)]
pub struct EncodedPatchData {
    pub map: MapValue,
    pub mask: Vec<FieldPath>,
}

impl EncodedPatchData {
    /// `updateMask.fieldPaths` query pairs, one per patched field.
    pub fn mask_query(&self) -> Vec<(String, String)> {
        self.mask
            .iter()
            .map(|field| ("updateMask.fieldPaths".to_string(), field.server_format()))
            .collect()
    }
}

/// Encodes patch data and derives the update mask from its top-level keys.
///
/// Keys are treated as single field names, so `"a.b"` patches a field
/// literally named `a.b` rather than a nested value.
pub fn encode_patch_data(fields: &IndexMap<String, NativeValue>) -> FirestoreResult<EncodedPatchData> {
    if fields.is_empty() {
        return Err(invalid_argument(
            "patch requires at least one field; an empty update mask would replace the document",
        ));
    }
    let map = encode_fields(fields)?;
    let mask = fields
        .keys()
        .map(|key| FieldPath::new([key.as_str()]))
        .collect::<FirestoreResult<Vec<_>>>()?;
    Ok(EncodedPatchData { map, mask })
}

/// Encodes a `list_page` ordering as the `orderBy` query parameter
/// (`"likes desc,title"`).
pub fn encode_list_order(order_by: &[OrderBy]) -> Option<String> {
    if order_by.is_empty() {
        return None;
    }
    let clauses = order_by
        .iter()
        .map(|order| match order.direction() {
            OrderDirection::Ascending => order.field().server_format(),
            OrderDirection::Descending => {
                format!("{} desc", order.field().server_format())
            }
        })
        .collect::<Vec<_>>();
    Some(clauses.join(","))
}
