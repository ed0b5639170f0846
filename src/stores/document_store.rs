//! Live document queries
//!
//! A `DocumentStore` answers standing queries with a stream of snapshots. Every
//! snapshot is the complete result set at that point in time, and the stream
//! stays open until the `Subscription` is dropped.

use chrono::{DateTime, Utc};
use futures::channel::mpsc::UnboundedReceiver;
use futures::stream::Stream;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A single document: its id within the collection plus its fields
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self { id: id.into(), fields }
    }

    /// Decode the document fields into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| StoreError::Decode(format!("document {}: {}", self.id, e)))
    }
}

/// Equality filter on one field
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub equals: Value,
}

/// A standing query against one collection
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filter: Option<FieldFilter>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filter: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.into(),
            equals: value.into(),
        });
        self
    }

    /// Reject queries that could never be answered
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.collection.trim().is_empty() {
            return Err(StoreError::InvalidQuery("collection name is empty".to_string()));
        }
        if let Some(filter) = &self.filter {
            if filter.field.trim().is_empty() {
                return Err(StoreError::InvalidQuery("filter field is empty".to_string()));
            }
        }
        Ok(())
    }

    /// Whether a document in this query's collection belongs to the result set
    pub fn matches(&self, document: &Document) -> bool {
        match &self.filter {
            Some(filter) => document.fields.get(&filter.field) == Some(&filter.equals),
            None => true,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{} where {} == {}", self.collection, filter.field, filter.equals),
            None => write!(f, "{}", self.collection),
        }
    }
}

/// Point-in-time result set of a live query
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    pub received_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            received_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Handle to a live query
///
/// Yields snapshots until dropped. Dropping (or calling `cancel`) unregisters
/// the query from the store that issued it.
pub struct Subscription {
    query: Query,
    receiver: UnboundedReceiver<Snapshot>,
    on_cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(query: Query, receiver: UnboundedReceiver<Snapshot>) -> Self {
        Self {
            query,
            receiver,
            on_cancel: None,
        }
    }

    /// Run `f` when this subscription goes away
    pub fn with_cancel(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    #[allow(dead_code)]
    pub fn cancel(self) {
        drop(self);
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
        self.receiver.poll_next_unpin(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
        log::debug!("Subscription cancelled: {}", self.query);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("query", &self.query).finish()
    }
}

/// A database that can answer live queries
pub trait DocumentStore {
    /// Open a live query. The first snapshot carries the current result set.
    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Errors raised by document stores
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The query cannot be executed
    InvalidQuery(String),
    /// A document did not have the expected shape
    Decode(String),
    /// The backend failed (network, HTTP status, malformed response)
    Backend(String),
    /// The backend cannot run in this environment
    Unsupported(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            Self::Decode(msg) => write!(f, "Failed to decode {}", msg),
            Self::Backend(msg) => write!(f, "Backend error: {}", msg),
            Self::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_query_matches_equality() {
        let query = Query::collection("Posts").where_eq("userUID", "alice");
        assert!(query.matches(&doc("p1", json!({"userUID": "alice"}))));
        assert!(!query.matches(&doc("p2", json!({"userUID": "bob"}))));
        assert!(!query.matches(&doc("p3", json!({"imageUrl": "x"}))));
    }

    #[test]
    fn test_unfiltered_query_matches_everything() {
        let query = Query::collection("Users");
        assert!(query.matches(&doc("u1", json!({}))));
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        assert!(Query::collection("").validate().is_err());
        assert!(Query::collection("Users").where_eq(" ", "x").validate().is_err());
        assert!(Query::collection("Users").where_eq("uid", "x").validate().is_ok());
    }

    #[test]
    fn test_cancel_runs_hook_once() {
        use std::cell::Cell;
        use std::rc::Rc;

        let (_tx, rx) = futures::channel::mpsc::unbounded();
        let calls = Rc::new(Cell::new(0));
        let calls_in_hook = calls.clone();
        let sub = Subscription::new(Query::collection("Users").where_eq("uid", "ada"), rx)
            .with_cancel(move || calls_in_hook.set(calls_in_hook.get() + 1));
        assert_eq!(sub.query().to_string(), "Users where uid == \"ada\"");
        sub.cancel();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_decode_error_names_document() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Strict {
            count: u32,
        }
        let err = doc("bad", json!({"count": "many"})).decode::<Strict>().unwrap_err();
        assert!(err.to_string().contains("document bad"));
    }
}
