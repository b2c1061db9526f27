use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::database::store::ID_FIELD;
use crate::types::Document;

/// A persisted (or about to be persisted) document with change tracking
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    /// State as last loaded from or saved to the store (None before first save)
    original: Option<Document>,
    /// Current field values
    fields: Document,
    /// Fields touched since `original`
    modified_fields: BTreeSet<String>,
}

impl Entity {
    /// Create a new, unsaved entity
    pub fn new(fields: Document) -> Self {
        Self {
            original: None,
            fields,
            modified_fields: BTreeSet::new(),
        }
    }

    /// Wrap a document returned by the store
    pub fn from_document(document: Document) -> Self {
        Self {
            original: Some(document.clone()),
            fields: document,
            modified_fields: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> Option<&Value> {
        self.fields.get(ID_FIELD)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set field value with change tracking
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        self.modified_fields.insert(key.clone());
        self.fields.insert(key, value.into());
        self
    }

    /// Remove a field entirely (absent, not null)
    pub fn unset(&mut self, key: &str) -> &mut Self {
        if self.fields.remove(key).is_some() || self.original_has(key) {
            self.modified_fields.insert(key.to_string());
        }
        self
    }

    /// Read a boolean flag; absent or non-boolean reads as false
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Parse an RFC 3339 timestamp field
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key)
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    fn original_has(&self, key: &str) -> bool {
        self.original.as_ref().is_some_and(|o| o.contains_key(key))
    }

    /// Check if a specific field differs from the stored state
    pub fn changed(&self, key: &str) -> bool {
        match (&self.original, self.fields.get(key)) {
            (Some(original), Some(current)) => original.get(key) != Some(current),
            (Some(original), None) => original.contains_key(key),
            (None, Some(_)) => true,
            (None, None) => false,
        }
    }

    /// Fields whose values differ from the stored state
    pub fn changed_fields(&self) -> Vec<&str> {
        self.modified_fields
            .iter()
            .filter(|f| self.changed(f))
            .map(String::as_str)
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        self.is_new() || !self.changed_fields().is_empty()
    }

    pub fn original(&self) -> Option<&Document> {
        self.original.as_ref()
    }

    pub fn document(&self) -> &Document {
        &self.fields
    }

    pub fn to_document(&self) -> Document {
        self.fields.clone()
    }

    pub fn into_document(self) -> Document {
        self.fields
    }

    /// Adopt the document the store persisted
    pub fn mark_saved(&mut self, persisted: Document) -> &mut Self {
        self.original = Some(persisted.clone());
        self.fields = persisted;
        self.modified_fields.clear();
        self
    }
}

impl From<Document> for Entity {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        Value::Object(entity.fields)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entity(id: {:?}, fields: {}, changed: {})",
            self.id(),
            self.fields.len(),
            self.has_changes()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_change_tracking() {
        let mut entity = Entity::from_document(doc(json!({ "_id": "a", "deleted": false, "name": "x" })));
        assert!(!entity.has_changes());

        entity.set("deleted", true);
        entity.set("name", "x");
        assert_eq!(entity.changed_fields(), vec!["deleted"]);
        assert!(entity.has_changes());
    }

    #[test]
    fn test_unset_removes_field() {
        let mut entity = Entity::from_document(doc(json!({ "_id": "a", "deletedBy": "u1" })));
        entity.unset("deletedBy");
        assert!(entity.get("deletedBy").is_none());
        assert!(entity.changed("deletedBy"));

        entity.unset("neverThere");
        assert!(!entity.changed("neverThere"));
    }

    #[test]
    fn test_mark_saved_resets_tracking() {
        let mut entity = Entity::new(doc(json!({ "name": "x" })));
        assert!(entity.is_new());
        entity.mark_saved(doc(json!({ "_id": "a", "name": "x", "deleted": false })));
        assert!(!entity.is_new());
        assert!(!entity.has_changes());
        assert_eq!(entity.id(), Some(&json!("a")));
    }

    #[test]
    fn test_timestamp_and_flag() {
        let entity = Entity::new(doc(json!({ "deleted": true, "deletedAt": "2024-05-01T10:00:00.000Z" })));
        assert!(entity.flag("deleted"));
        assert!(!entity.flag("missing"));
        assert!(entity.timestamp("deletedAt").is_some());
    }
}
