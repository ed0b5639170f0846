use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::stores::document_store::StoreError;
use crate::stores::memory_store::MemoryStore;

const DEMO_DATA: &str = include_str!("../../assets/seed.json");

/// Fill `store` with the bundled demo users and posts
pub fn load_demo_data(store: &MemoryStore) -> Result<usize, StoreError> {
    load_json(store, DEMO_DATA)
}

/// Load `{ "Collection": { "docId": { ...fields } } }` into `store`
pub fn load_json(store: &MemoryStore, raw: &str) -> Result<usize, StoreError> {
    let collections: BTreeMap<String, BTreeMap<String, Map<String, Value>>> =
        serde_json::from_str(raw).map_err(|e| StoreError::Decode(format!("seed data: {}", e)))?;

    let mut count = 0;
    for (collection, documents) in collections {
        for (id, fields) in documents {
            store.set_document(&collection, &id, fields);
            count += 1;
        }
    }
    log::info!("Loaded {} seed documents", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_demo_data_parses() {
        let store = MemoryStore::new();
        let count = load_demo_data(&store).unwrap();
        assert!(count > 0);
        assert!(store.get_document("Users", "user-ada").is_some());
    }

    #[test]
    fn test_rejects_malformed_seed() {
        let store = MemoryStore::new();
        assert!(load_json(&store, r#"{"Users": ["not", "a", "map"]}"#).is_err());
    }
}
