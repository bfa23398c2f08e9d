use indexmap::IndexMap;

use crate::value::FirestoreValue;

/// Field map preserving the order in which entries were inserted or received.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapValue {
    fields: IndexMap<String, FirestoreValue>,
}

impl MapValue {
    pub fn new(fields: IndexMap<String, FirestoreValue>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &IndexMap<String, FirestoreValue> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FirestoreValue> {
        self.fields.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_map_entries_in_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("zeta".to_string(), FirestoreValue::from_integer(1));
        map.insert("alpha".to_string(), FirestoreValue::from_bool(true));
        let value = MapValue::new(map);
        let keys: Vec<_> = value.fields().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(value.get("zeta"), Some(&FirestoreValue::from_integer(1)));
    }
}
