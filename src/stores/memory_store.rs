use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::channel::mpsc::{unbounded, UnboundedSender};
use serde_json::{Map, Value};

use crate::stores::document_store::{Document, DocumentStore, Query, Snapshot, StoreError, Subscription};

/// A registered live query and the last result set it was sent
struct Listener {
    query: Query,
    sender: UnboundedSender<Snapshot>,
    last_sent: Vec<Document>,
}

#[derive(Default)]
struct Inner {
    /// collection -> (document id -> fields). BTreeMap keeps result order stable.
    collections: HashMap<String, BTreeMap<String, Map<String, Value>>>,
    listeners: HashMap<u64, Listener>,
    next_listener_id: u64,
}

impl Inner {
    fn run_query(&self, query: &Query) -> Vec<Document> {
        self.collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .filter(|doc| query.matches(doc))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push a snapshot to every listener on `collection` whose result set changed
    fn notify(&mut self, collection: &str) {
        let mut updates = Vec::new();
        for (id, listener) in self.listeners.iter() {
            if listener.query.collection != collection {
                continue;
            }
            let documents = self.run_query(&listener.query);
            if documents != listener.last_sent {
                updates.push((*id, documents));
            }
        }

        let mut closed = Vec::new();
        for (id, documents) in updates {
            if let Some(listener) = self.listeners.get_mut(&id) {
                if listener.sender.unbounded_send(Snapshot::new(documents.clone())).is_err() {
                    closed.push(id);
                } else {
                    listener.last_sent = documents;
                }
            }
        }

        for id in closed {
            self.listeners.remove(&id);
        }
    }
}

/// In-process document database with live queries
///
/// Cloning is cheap and clones share the same data. Every write that changes a
/// live query's result set delivers a fresh snapshot to that query.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Recover from a poisoned mutex rather than losing the whole store
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or replace a document
    pub fn set_document(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        inner.notify(collection);
    }

    /// Insert or replace a document from a JSON object value
    pub fn set_json(&self, collection: &str, id: &str, value: Value) -> Result<(), StoreError> {
        match value {
            Value::Object(fields) => {
                self.set_document(collection, id, fields);
                Ok(())
            }
            other => Err(StoreError::Decode(format!(
                "document {}/{}: expected an object, got {}",
                collection, id, other
            ))),
        }
    }

    /// Remove a document; returns whether it existed
    pub fn delete_document(&self, collection: &str, id: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner
            .collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false);
        if removed {
            inner.notify(collection);
        }
        removed
    }

    #[allow(dead_code)]
    pub fn get_document(&self, collection: &str, id: &str) -> Option<Document> {
        let inner = self.lock();
        inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone()))
    }

    /// Number of live queries currently registered
    #[allow(dead_code)]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        query.validate()?;

        let (sender, receiver) = unbounded();
        let mut inner = self.lock();
        let initial = inner.run_query(&query);
        sender
            .unbounded_send(Snapshot::new(initial.clone()))
            .map_err(|e| StoreError::Backend(format!("failed to deliver snapshot: {}", e)))?;

        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.insert(
            id,
            Listener {
                query: query.clone(),
                sender,
                last_sent: initial,
            },
        );
        drop(inner);

        log::debug!("Memory store: listener {} registered for {}", id, query);

        let weak = Arc::downgrade(&self.inner);
        Ok(Subscription::new(query, receiver).with_cancel(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                inner.listeners.remove(&id);
            }
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt};
    use serde_json::json;

    fn ids(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.documents.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_initial_snapshot_on_subscribe() {
        let store = MemoryStore::new();
        store.set_json("Posts", "p1", json!({"userUID": "alice"})).unwrap();
        store.set_json("Posts", "p2", json!({"userUID": "bob"})).unwrap();

        let mut sub = store
            .subscribe(Query::collection("Posts").where_eq("userUID", "alice"))
            .unwrap();
        let snapshot = sub.next().now_or_never().flatten().unwrap();
        assert_eq!(ids(&snapshot), vec!["p1"]);
    }

    #[test]
    fn test_empty_collection_yields_empty_snapshot() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe(Query::collection("Users")).unwrap();
        let snapshot = sub.next().now_or_never().flatten().unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_write_pushes_new_snapshot() {
        let store = MemoryStore::new();
        let mut sub = store
            .subscribe(Query::collection("Posts").where_eq("userUID", "alice"))
            .unwrap();
        let _ = sub.next().now_or_never();

        store.set_json("Posts", "p1", json!({"userUID": "alice"})).unwrap();
        let snapshot = sub.next().now_or_never().flatten().unwrap();
        assert_eq!(snapshot.len(), 1);

        store.delete_document("Posts", "p1");
        let snapshot = sub.next().now_or_never().flatten().unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_unrelated_write_does_not_notify() {
        let store = MemoryStore::new();
        let mut sub = store
            .subscribe(Query::collection("Posts").where_eq("userUID", "alice"))
            .unwrap();
        let _ = sub.next().now_or_never();

        store.set_json("Posts", "p9", json!({"userUID": "bob"})).unwrap();
        store.set_json("Users", "u1", json!({"uid": "alice"})).unwrap();
        assert!(sub.next().now_or_never().is_none());
    }

    #[test]
    fn test_drop_unregisters_listener() {
        let store = MemoryStore::new();
        let sub = store.subscribe(Query::collection("Users")).unwrap();
        assert_eq!(store.listener_count(), 1);
        drop(sub);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_rejects_non_object_json() {
        let store = MemoryStore::new();
        assert!(store.set_json("Users", "u1", json!([1, 2])).is_err());
        assert!(store.get_document("Users", "u1").is_none());
    }

    #[test]
    fn test_rejects_invalid_query() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.subscribe(Query::collection("")),
            Err(StoreError::InvalidQuery(_))
        ));
    }
}
