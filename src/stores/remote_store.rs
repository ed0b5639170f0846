//! Firestore REST backend
//!
//! Firestore's realtime listeners need gRPC streaming, which is not available
//! from the browser without the JS SDK. Instead each live query polls
//! `documents:runQuery` and emits a snapshot whenever the result set changes.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::stores::document_store::{Document, DocumentStore, Query, StoreError, Subscription};

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1/";

#[derive(Clone, Debug)]
pub struct RemoteStore {
    project_id: String,
    api_key: Option<String>,
    poll_interval_ms: u32,
    http: reqwest::Client,
}

impl RemoteStore {
    pub fn new(project_id: String, api_key: Option<String>, poll_interval_ms: u32) -> Self {
        Self {
            project_id,
            api_key,
            poll_interval_ms: poll_interval_ms.max(250),
            http: reqwest::Client::new(),
        }
    }

    /// `.../projects/{id}/databases/(default)/documents:runQuery?key=...`
    pub fn run_query_url(&self) -> Result<Url, StoreError> {
        let path = format!(
            "projects/{}/databases/(default)/documents:runQuery",
            self.project_id
        );
        let mut url = Url::parse(FIRESTORE_API)
            .and_then(|base| base.join(&path))
            .map_err(|e| StoreError::InvalidQuery(format!("bad project id: {}", e)))?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    /// Execute the query once
    pub async fn fetch(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let url = self.run_query_url()?;
        let response = self
            .http
            .post(url)
            .json(&structured_query(query))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("HTTP {}: {}", status, body)));
        }

        let rows: Vec<RunQueryRow> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("runQuery response: {}", e)))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.document)
            .map(FirestoreDocument::into_document)
            .collect())
    }
}

impl DocumentStore for RemoteStore {
    #[cfg(target_arch = "wasm32")]
    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        use crate::stores::document_store::Snapshot;

        query.validate()?;
        let (sender, receiver) = futures::channel::mpsc::unbounded();
        let store = self.clone();
        let poll_query = query.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let mut last: Option<Vec<Document>> = None;
            // Exit once the subscriber has dropped its stream
            while !sender.is_closed() {
                match store.fetch(&poll_query).await {
                    Ok(documents) => {
                        if last.as_ref() != Some(&documents) {
                            if sender.unbounded_send(Snapshot::new(documents.clone())).is_err() {
                                break;
                            }
                            last = Some(documents);
                        }
                    }
                    Err(e) => log::warn!("Polling {} failed: {}", poll_query, e),
                }
                gloo_timers::future::TimeoutFuture::new(store.poll_interval_ms).await;
            }
            log::debug!("Stopped polling {}", poll_query);
        });

        Ok(Subscription::new(query, receiver))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        query.validate()?;
        Err(StoreError::Unsupported(
            "the Firestore backend polls from the browser event loop".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "firestore"
    }
}

/// Request body for `runQuery`
fn structured_query(query: &Query) -> Value {
    let mut structured = json!({
        "from": [{ "collectionId": query.collection }],
    });
    if let Some(filter) = &query.filter {
        structured["where"] = json!({
            "fieldFilter": {
                "field": { "fieldPath": filter.field },
                "op": "EQUAL",
                "value": to_firestore_value(&filter.equals),
            }
        });
    }
    json!({ "structuredQuery": structured })
}

#[derive(Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[derive(Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreDocument {
    fn into_document(self) -> Document {
        // name is "projects/p/databases/(default)/documents/Users/abc"
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        let fields = self
            .fields
            .into_iter()
            .map(|(key, value)| (key, from_firestore_value(&value)))
            .collect();
        Document::new(id, fields)
    }
}

/// Convert a typed Firestore value (`{"stringValue": "x"}`) into plain JSON
pub fn from_firestore_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "booleanValue" | "doubleValue" => inner.clone(),
        // int64 travels as a string
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(from_firestore_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), from_firestore_value(v)))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}

/// Inverse of `from_firestore_value`, used for filter values
pub fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(fields) => json!({
            "mapValue": {
                "fields": fields
                    .iter()
                    .map(|(k, v)| (k.clone(), to_firestore_value(v)))
                    .collect::<Map<String, Value>>()
            }
        }),
    }
}
