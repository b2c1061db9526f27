use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DeletedByType;

/// Storage type of a declared soft delete field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Boolean,
    Date,
    DeletedBy(DeletedByType),
}

/// A field the soft delete layer adds to the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub kind: FieldKind,
    pub default_value: Option<Value>,
    pub index: bool,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default_value: None,
            index: false,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn indexed(mut self, index: bool) -> Self {
        self.index = index;
        self
    }
}
