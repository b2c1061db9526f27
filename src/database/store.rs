use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::filter::{Query, QueryOptions};
use crate::types::Document;

/// Failures reported by the underlying document store
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    Query(String),
}

/// Outcome of an update-style operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Canonical update request as delivered to the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCommand {
    pub conditions: Option<Document>,
    pub update: Option<Document>,
    pub options: QueryOptions,
}

impl UpdateCommand {
    pub fn new(conditions: Document, update: Document, options: QueryOptions) -> Self {
        Self {
            conditions: Some(conditions),
            update: Some(update),
            options,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptions {
    pub validate_before_save: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { validate_before_save: true }
    }
}

impl SaveOptions {
    pub fn validate(validate_before_save: bool) -> Self {
        Self { validate_before_save }
    }
}

/// The document store being augmented
///
/// Implementations own persistence, durability and concurrency; the soft
/// delete layer only rewrites arguments before calling in.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, query: Query) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, query: Query) -> Result<Option<Document>, StoreError>;

    async fn count(&self, query: Query) -> Result<u64, StoreError>;

    async fn count_documents(&self, query: Query) -> Result<u64, StoreError>;

    async fn find_one_and_update(&self, command: UpdateCommand) -> Result<Option<Document>, StoreError>;

    /// Legacy update: one document unless `options.multi` is set
    async fn update(&self, command: UpdateCommand) -> Result<UpdateResult, StoreError>;

    async fn update_one(&self, command: UpdateCommand) -> Result<UpdateResult, StoreError>;

    async fn update_many(&self, command: UpdateCommand) -> Result<UpdateResult, StoreError>;

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError>;

    /// Persist a save command, returning the stored document
    ///
    /// Validation (when enabled) runs against the document as it will be
    /// stored, so a patch is validated after merging.
    async fn save(&self, command: SaveCommand, options: SaveOptions) -> Result<Document, StoreError>;
}

/// Identifier field used by stores and `deleteById`
pub const ID_FIELD: &str = "_id";

pub fn document_id(document: &Document) -> Option<&Value> {
    document.get(ID_FIELD)
}

/// What a save writes
#[derive(Debug, Clone, PartialEq)]
pub enum SaveCommand {
    /// Insert, or replace the stored document with the same `_id`
    Replace(Document),
    /// Write only the changed paths of a stored document; other fields are kept
    Patch {
        id: Value,
        set: Document,
        unset: Vec<String>,
    },
}

impl SaveCommand {
    /// Diff `current` against the state it was loaded as
    ///
    /// Fields missing from both (for example, outside a projection) are left
    /// alone in the store. Falls back to `Replace` when there is no `_id`.
    pub fn changes(original: &Document, current: Document) -> Self {
        let Some(id) = document_id(&current).or_else(|| document_id(original)).cloned() else {
            return Self::Replace(current);
        };

        let unset = original
            .keys()
            .filter(|key| !current.contains_key(key.as_str()))
            .cloned()
            .collect();
        let set = current
            .into_iter()
            .filter(|(key, value)| key != ID_FIELD && original.get(key) != Some(value))
            .collect();

        Self::Patch { id, set, unset }
    }
}

impl From<Document> for SaveCommand {
    fn from(document: Document) -> Self {
        Self::Replace(document)
    }
}
