#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use serde_json::{json, Value};
use soft_delete_rust::config::Selection;
use soft_delete_rust::{Document, MemoryStore, SoftDeleteConfig, SoftDeleteModel, StoreError};

static TRACING: Once = Once::new();

/// Install a fmt subscriber once per test binary; RUST_LOG controls output
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap_or_default()
}

/// Three active documents and two deleted ones; every document carries the flag
pub fn seed_documents() -> Vec<Document> {
    vec![
        doc(json!({ "_id": "a1", "name": "alpha", "group": "x", "deleted": false })),
        doc(json!({ "_id": "a2", "name": "bravo", "group": "y", "deleted": false })),
        doc(json!({ "_id": "a3", "name": "charlie", "group": "x", "deleted": false })),
        doc(json!({ "_id": "d1", "name": "delta", "group": "x", "deleted": true })),
        doc(json!({ "_id": "d2", "name": "echo", "group": "y", "deleted": true })),
    ]
}

pub fn all_methods() -> SoftDeleteConfig {
    SoftDeleteConfig::new().with_override_methods(Selection::Flag(true))
}

/// Model over a seeded store, plus the store for inspecting recorded calls
pub fn seeded_model(config: SoftDeleteConfig) -> (SoftDeleteModel<MemoryStore>, Arc<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::with_documents(seed_documents()));
    (SoftDeleteModel::new(store.clone(), &config), store)
}

pub fn empty_model(config: SoftDeleteConfig) -> (SoftDeleteModel<MemoryStore>, Arc<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    (SoftDeleteModel::new(store.clone(), &config), store)
}

pub fn ids<I, T>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    let mut ids: Vec<String> = items
        .into_iter()
        .filter_map(|item| item.into().get("_id").and_then(Value::as_str).map(str::to_string))
        .collect();
    ids.sort();
    ids
}

/// Captures what a completion handler was called with
pub type Captured = Arc<Mutex<Vec<Result<Value, StoreError>>>>;

pub fn capture() -> Captured {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recorder(sink: &Captured) -> impl FnOnce(Result<&Value, &StoreError>) + Send + 'static {
    let sink = sink.clone();
    move |result: Result<&Value, &StoreError>| {
        let owned = result.map(Value::clone).map_err(StoreError::clone);
        if let Ok(mut calls) = sink.lock() {
            calls.push(owned);
        }
    }
}
